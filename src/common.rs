use bevy::prelude::*;
use serde::de::Visitor;
use serde::{Deserialize, Deserializer, de::Error};
use std::fmt;

pub type TrainId = String;
pub type TrackNo = u32;

/// Numeric part of a `<prefix>-<number>` trainset identifier.
///
/// Only the leading digits after the first dash are taken into account, so `T-807` and `T-807b` both
/// yield 807. Identifiers without a numeric suffix map to 0.
pub fn numeric_suffix(train_id: &str) -> u32 {
    let Some(suffix) = train_id.split('-').nth(1) else {
        return 0;
    };
    let digits = suffix.bytes().take_while(u8::is_ascii_digit).count();
    suffix[..digits].parse().unwrap_or(0)
}

#[derive(Reflect, Copy, Clone, Debug)]
pub struct HexColor(Srgba);

impl<'de> Deserialize<'de> for HexColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ColorVisitor;

        impl<'de> Visitor<'de> for ColorVisitor {
            type Value = HexColor;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a hex color string (e.g., #ff0000)")
            }

            fn visit_str<E: Error>(self, v: &str) -> Result<Self::Value, E> {
                Srgba::hex(v).map_err(E::custom).map(HexColor)
            }
        }

        deserializer.deserialize_str(ColorVisitor)
    }
}

impl HexColor {
    pub fn rgb_u8(r: u8, g: u8, b: u8) -> Self {
        HexColor(Srgba::rgb_u8(r, g, b))
    }
}

impl From<HexColor> for Color {
    fn from(c: HexColor) -> Self {
        c.0.into()
    }
}
