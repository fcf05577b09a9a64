// bp-core/src/units.rs

use uom::si::f64::{
    ElectricCharge as UomElectricCharge, ElectricCurrent as UomElectricCurrent,
    ThermodynamicTemperature as UomThermodynamicTemperature, Time as UomTime,
};

// Public canonical unit types (SI, f64)
pub type Charge = UomElectricCharge;
pub type Current = UomElectricCurrent;
pub type Temperature = UomThermodynamicTemperature;
pub type Time = UomTime;

#[inline]
pub fn amps(v: f64) -> Current {
    use uom::si::electric_current::ampere;
    Current::new::<ampere>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn minutes(v: f64) -> Time {
    use uom::si::time::minute;
    Time::new::<minute>(v)
}

#[inline]
pub fn hours(v: f64) -> Time {
    use uom::si::time::hour;
    Time::new::<hour>(v)
}

#[inline]
pub fn in_seconds(t: Time) -> f64 {
    use uom::si::time::second;
    t.get::<second>()
}

pub fn celsius_to_kelvin(t_c: f64) -> f64 {
    use uom::si::thermodynamic_temperature::{degree_celsius, kelvin};
    Temperature::new::<degree_celsius>(t_c).get::<kelvin>()
}

pub fn kelvin_to_celsius(t_k: f64) -> f64 {
    use uom::si::thermodynamic_temperature::degree_celsius;
    k(t_k).get::<degree_celsius>()
}

/// Charge moved by `current` flowing for `duration`, in ampere-hours.
pub fn charge_ah(current: Current, duration: Time) -> f64 {
    use uom::si::electric_charge::ampere_hour;
    let q: Charge = current * duration;
    q.get::<ampere_hour>()
}

pub mod constants {
    pub const SECONDS_PER_HOUR: f64 = 3600.0;
    pub const ZERO_CELSIUS_K: f64 = 273.15;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_units_convert_to_seconds() {
        assert_eq!(in_seconds(s(10.0)), 10.0);
        assert_eq!(in_seconds(minutes(1.0)), 60.0);
        assert_eq!(in_seconds(hours(0.5)), 1800.0);
    }

    #[test]
    fn celsius_kelvin_round_trip() {
        assert!((celsius_to_kelvin(40.0) - 313.15).abs() < 1e-9);
        assert!((kelvin_to_celsius(253.15) + 20.0).abs() < 1e-9);
        assert!((celsius_to_kelvin(0.0) - constants::ZERO_CELSIUS_K).abs() < 1e-9);
    }

    #[test]
    fn one_amp_for_one_hour_is_one_amp_hour() {
        let q = charge_ah(amps(1.0), s(constants::SECONDS_PER_HOUR));
        assert!((q - 1.0).abs() < 1e-12);
    }
}
