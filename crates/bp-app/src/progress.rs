#[derive(Debug, Clone, PartialEq)]
pub enum RunStage {
    ValidatingConfig,
    CheckingCache,
    LoadingCachedResult,
    Solving,
    PostProcessing,
    SavingResults,
    TestCompleted,
    TestFailed,
    TestSkipped,
    Completed,
}

impl RunStage {
    pub fn label(&self) -> &'static str {
        match self {
            RunStage::ValidatingConfig => "validating",
            RunStage::CheckingCache => "cache",
            RunStage::LoadingCachedResult => "loading",
            RunStage::Solving => "solving",
            RunStage::PostProcessing => "post-processing",
            RunStage::SavingResults => "saving",
            RunStage::TestCompleted => "done",
            RunStage::TestFailed => "failed",
            RunStage::TestSkipped => "skipped",
            RunStage::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunProgressEvent {
    /// Test the event belongs to; `None` for run-level stages
    pub label: Option<String>,
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    /// Tests finished so far, successful or not
    pub completed: usize,
    pub total: usize,
    pub message: Option<String>,
}

impl RunProgressEvent {
    pub fn fraction_complete(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}
