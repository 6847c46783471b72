use chrono::{DateTime, TimeZone, Utc};
use segment_core::{Message, Segmenter, SegmenterConfig, Ssvid};

pub const SSVID: Ssvid = Ssvid(123456789);

pub fn segmenter() -> Segmenter {
    Segmenter::new(SSVID, SegmenterConfig::default()).unwrap()
}

pub fn at(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0).unwrap()
}

pub fn position(seconds: i64, lat: f64, lon: f64) -> Message {
    serde_json::from_value(serde_json::json!({
        "ssvid": SSVID.0,
        "timestamp": at(seconds),
        "lat": lat,
        "lon": lon,
    }))
    .unwrap()
}

pub fn underway(seconds: i64, lat: f64, lon: f64, speed: f64, course: f64) -> Message {
    let mut msg = position(seconds, lat, lon);
    msg.speed = Some(speed);
    msg.course = Some(course);
    msg.message_type = Some(1);
    msg
}

pub fn named(seconds: i64, lat: f64, lon: f64, shipname: &str) -> Message {
    let mut msg = position(seconds, lat, lon);
    msg.shipname = Some(shipname.to_string());
    msg
}

pub fn info(seconds: i64, shipname: &str) -> Message {
    serde_json::from_value(serde_json::json!({
        "ssvid": SSVID.0,
        "timestamp": at(seconds),
        "type": 5,
        "shipname": shipname,
    }))
    .unwrap()
}
