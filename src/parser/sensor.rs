//! Read-only sensors: temperature/humidity, motion and contact.

use crate::parser::{ParseContext, Parser};
use crate::protocol::Report;
use crate::protocol::model::prefix;
use crate::types::{AccessoryKey, Reading, ReadingValue};

/// Raw temperature and humidity are hundredths.
const CENTI: f64 = 100.0;

/// `sensor_ht`: two readings sharing one battery.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemperatureHumidityParser;

impl Parser for TemperatureHumidityParser {
    fn decode(&self, report: &Report, ctx: &mut ParseContext<'_>) -> Vec<Reading> {
        let mut readings = Vec::with_capacity(2);

        if let Some(raw) = report.data.number_field("temperature") {
            readings.push(Reading {
                key: AccessoryKey::new(prefix::TEMPERATURE, &report.sid),
                value: ReadingValue::Temperature(raw / CENTI),
                battery: ctx.battery,
            });
        }
        if let Some(raw) = report.data.number_field("humidity") {
            readings.push(Reading {
                key: AccessoryKey::new(prefix::HUMIDITY, &report.sid),
                value: ReadingValue::Humidity(raw / CENTI),
                battery: ctx.battery,
            });
        }

        readings
    }
}

/// `motion`: `status == "motion"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MotionParser;

impl Parser for MotionParser {
    fn decode(&self, report: &Report, ctx: &mut ParseContext<'_>) -> Vec<Reading> {
        let detected = report.data.str_field("status") == Some("motion");
        vec![Reading {
            key: AccessoryKey::new(prefix::MOTION, &report.sid),
            value: ReadingValue::Motion(detected),
            battery: ctx.battery,
        }]
    }
}

/// `magnet`: `status == "close"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagnetParser;

impl Parser for MagnetParser {
    fn decode(&self, report: &Report, ctx: &mut ParseContext<'_>) -> Vec<Reading> {
        let contact = report.data.str_field("status") == Some("close");
        vec![Reading {
            key: AccessoryKey::new(prefix::MAGNET, &report.sid),
            value: ReadingValue::Contact(contact),
            battery: ctx.battery,
        }]
    }
}
