use serde::Deserialize;

#[derive(Deserialize)]
pub struct Hourly {
    pub time: Vec<String>,
    pub precipitation: Vec<Option<f64>>,
}

#[derive(Deserialize)]
pub struct OpenMeteoResponse {
    pub hourly: Hourly,
}
