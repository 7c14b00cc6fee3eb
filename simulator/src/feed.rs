//! Synthetic household producing sensor readings over a simulated day.

use std::f32::consts::PI;

use energy_flow_card::SensorSnapshot;

// =============================================================================
// Sensor Ids
// =============================================================================

pub const PV_STRING_1: &str = "sensor.pv_string_1";
pub const PV_STRING_2: &str = "sensor.pv_string_2";
pub const PV_GARAGE: &str = "sensor.pv_garage";
pub const PV_DAILY: &str = "sensor.pv_daily";
pub const BATTERY_SOC: &str = "sensor.battery_soc";
pub const BATTERY_POWER: &str = "sensor.battery_power";
pub const HOME_LOAD: &str = "sensor.home_load";
pub const GRID_POWER: &str = "sensor.grid_power";
pub const CAR_POWER: [&str; 2] = ["sensor.car_power", "sensor.car2_power"];
pub const CAR_SOC: [&str; 2] = ["sensor.car_soc", "sensor.car2_soc"];
pub const HEAT_PUMP: &str = "sensor.heat_pump";

// =============================================================================
// Household Model
// =============================================================================

const PEAK_SOLAR_W: f32 = 5200.0;
const GARAGE_SHARE: f32 = 0.3;
const BATTERY_CAPACITY_WH: f32 = 10_000.0;
const BATTERY_MAX_W: f32 = 3000.0;
const BATTERY_MIN_SOC: f32 = 5.0;
const CAR_CAPACITY_WH: [f32; 2] = [60_000.0, 40_000.0];
const CAR_CHARGE_W: [f32; 2] = [7400.0, 3700.0];
const HEAT_PUMP_W: f32 = 900.0;

/// One instant of the simulated household, all in watts.
#[derive(Clone, Copy, Debug, Default)]
struct Powers {
    strings: [f32; 2],
    garage: f32,
    load: f32,
    heat_pump: f32,
    cars: [f32; 2],
    battery: f32,
    grid: f32,
}

#[derive(Debug)]
pub struct DayCycle {
    hour: f32,
    battery_soc: f32,
    car_soc: [f32; 2],
    daily_kwh: f32,
    powers: Powers,
}

impl DayCycle {
    pub fn new(start_hour: f32) -> Self {
        let mut cycle = Self {
            hour: start_hour.rem_euclid(24.0),
            battery_soc: 40.0,
            car_soc: [35.0, 60.0],
            daily_kwh: 0.0,
            powers: Powers::default(),
        };
        cycle.powers = cycle.balance();
        cycle
    }

    #[inline]
    pub const fn hour(&self) -> f32 { self.hour }

    /// Move the simulated clock forward and integrate energy.
    pub fn advance(
        &mut self,
        dt_hours: f32,
    ) {
        let p = self.powers;
        self.battery_soc = (self.battery_soc + p.battery * dt_hours / BATTERY_CAPACITY_WH * 100.0).clamp(0.0, 100.0);
        for (i, soc) in self.car_soc.iter_mut().enumerate() {
            *soc = (*soc + p.cars[i] * dt_hours / CAR_CAPACITY_WH[i] * 100.0).min(100.0);
        }
        self.daily_kwh += (p.strings[0] + p.strings[1] + p.garage) * dt_hours / 1000.0;

        self.hour += dt_hours;
        if self.hour >= 24.0 {
            self.hour -= 24.0;
            self.daily_kwh = 0.0;
            self.car_soc = [30.0, 45.0];
        }
        self.powers = self.balance();
    }

    /// Readings as the host would report them.
    pub fn snapshot(&self) -> SensorSnapshot {
        let p = self.powers;
        let mut s = SensorSnapshot::new();
        s.set(PV_STRING_1, format!("{:.0}", p.strings[0]), "W");
        s.set(PV_STRING_2, format!("{:.0}", p.strings[1]), "W");
        s.set(PV_GARAGE, format!("{:.3}", p.garage / 1000.0), "kW");
        s.set(PV_DAILY, format!("{:.2}", self.daily_kwh), "kWh");
        s.set(BATTERY_SOC, format!("{:.0}", self.battery_soc), "%");
        s.set(BATTERY_POWER, format!("{:.0}", p.battery), "W");
        s.set(HOME_LOAD, format!("{:.0}", p.load), "W");
        s.set(GRID_POWER, format!("{:.3}", p.grid / 1000.0), "kW");
        s.set(HEAT_PUMP, format!("{:.0}", p.heat_pump), "W");
        for i in 0..2 {
            s.set(CAR_POWER[i], format!("{:.0}", p.cars[i]), "W");
            s.set(CAR_SOC[i], format!("{:.0}", self.car_soc[i]), "%");
        }
        s
    }

    fn balance(&self) -> Powers {
        let h = self.hour;
        let sun = ((h - 6.0) * PI / 13.0).sin().max(0.0);
        let clouds = fake_signal(h, 0.75, 1.0, 5.0);
        let solar = PEAK_SOLAR_W * sun * clouds;

        let evening = fake_signal(h - 13.0, 0.0, 1.0, PI / 12.0);
        let load = 320.0 + 900.0 * evening.powi(3) + fake_signal(h, 0.0, 120.0, 11.0);
        let heat_pump = if (5.0..8.0).contains(&h) || (17.0..21.0).contains(&h) { HEAT_PUMP_W } else { 0.0 };

        let charging = [(18.0..23.5).contains(&h), (0.5..5.0).contains(&h)];
        let cars = std::array::from_fn(|i| if charging[i] && self.car_soc[i] < 90.0 { CAR_CHARGE_W[i] } else { 0.0 });

        let demand = load + heat_pump + cars[0] + cars[1];
        let surplus = solar - demand;
        let mut battery = surplus.clamp(-BATTERY_MAX_W, BATTERY_MAX_W);
        if (battery > 0.0 && self.battery_soc >= 100.0) || (battery < 0.0 && self.battery_soc <= BATTERY_MIN_SOC) {
            battery = 0.0;
        }

        Powers {
            strings: [solar * (1.0 - GARAGE_SHARE) * 0.55, solar * (1.0 - GARAGE_SHARE) * 0.45],
            garage: solar * GARAGE_SHARE,
            load,
            heat_pump,
            cars,
            battery,
            grid: battery - surplus,
        }
    }
}

fn fake_signal(
    t: f32,
    min: f32,
    max: f32,
    freq: f32,
) -> f32 {
    let normalized = (t * freq).sin().mul_add(0.5, 0.5);
    min + normalized * (max - min)
}
