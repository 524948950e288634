use serde::Serialize;

/// weewx `METRICWX` unit system: °C, hPa, m/s, mm.
pub const METRICWX: u8 = 0x11;

/// One loop packet for the logging host. `None` serializes as `null`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub date_time: i64,
    pub us_units: u8,
    pub out_temp: Option<f64>,
    pub out_humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub soil_temp1: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_gust: Option<f64>,
    pub wind_dir: Option<f64>,
    pub rain: Option<f64>,
}

impl Observation {
    pub fn new(date_time: i64) -> Observation {
        Observation {
            date_time,
            us_units: METRICWX,
            ..Observation::default()
        }
    }
}
