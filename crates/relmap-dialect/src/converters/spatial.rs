//! Point storage: Postgres native `point` and WKT geometries.

use std::sync::OnceLock;

use regex::Regex;
use relmap_core::{MappingError, Point, Value};

use crate::converter::{ValueConverter, mismatch};

fn wkt_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*(?:SRID=(-?\d+);)?\s*POINT\s*\(\s*([-+0-9.eE]+)\s+([-+0-9.eE]+)\s*\)\s*$",
        )
        .expect("static pattern")
    })
}

fn native_point_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*\(\s*([-+0-9.eE]+)\s*,\s*([-+0-9.eE]+)\s*\)\s*$")
            .expect("static pattern")
    })
}

fn coordinate(input: &str, text: &str) -> Result<f64, MappingError> {
    text.parse().map_err(|_| MappingError::MalformedSpatial {
        input: input.to_string(),
    })
}

/// Points with NaN or infinite coordinates have no text form that reads back.
fn finite(point: Point) -> Result<Point, MappingError> {
    if point.x.is_finite() && point.y.is_finite() {
        Ok(point)
    } else {
        Err(MappingError::MalformedSpatial {
            input: format!("({},{})", point.x, point.y),
        })
    }
}

/// Parse `POINT(x y)` or EWKT `SRID=n;POINT(x y)`.
pub fn parse_wkt_point(input: &str) -> Result<Point, MappingError> {
    let caps = wkt_regex()
        .captures(input)
        .ok_or_else(|| MappingError::MalformedSpatial {
            input: input.to_string(),
        })?;
    Ok(Point::new(
        coordinate(input, &caps[2])?,
        coordinate(input, &caps[3])?,
    ))
}

/// Render a point as WKT.
pub fn format_wkt_point(point: Point) -> String {
    format!("POINT({} {})", point.x, point.y)
}

/// Postgres native `point`, text form `(x,y)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgPointConverter;

impl ValueConverter for PgPointConverter {
    fn name(&self) -> &'static str {
        "point"
    }

    fn read_value(&self, raw: &Value) -> Result<Value, MappingError> {
        match raw.untyped() {
            Value::Null => Ok(Value::Null),
            Value::Point(p) => Ok(Value::Point(*p)),
            Value::Text(s) => {
                let caps = native_point_regex()
                    .captures(s)
                    .ok_or_else(|| MappingError::MalformedSpatial { input: s.clone() })?;
                Ok(Value::Point(Point::new(
                    coordinate(s, &caps[1])?,
                    coordinate(s, &caps[2])?,
                )))
            }
            other => Err(mismatch("point", other)),
        }
    }

    fn write(&self, native: Value) -> Result<Value, MappingError> {
        match native.into_untyped() {
            Value::Null => Ok(Value::Null),
            Value::Point(p) => {
                let p = finite(p)?;
                Ok(Value::typed("point", Value::Text(format!("({},{})", p.x, p.y))))
            }
            other => Err(mismatch("point", &other)),
        }
    }

    fn format_parameter(&self, param: &str) -> String {
        format!("(:{param})::point")
    }
}

/// A point stored as a spatial geometry, bound as WKT.
#[derive(Debug, Clone, Copy)]
pub struct WktPointConverter {
    srid: i32,
}

impl WktPointConverter {
    /// Converter binding geometries in spatial reference system `srid`.
    pub const fn new(srid: i32) -> Self {
        Self { srid }
    }

    /// Spatial reference id written into literals.
    pub const fn srid(&self) -> i32 {
        self.srid
    }
}

impl ValueConverter for WktPointConverter {
    fn name(&self) -> &'static str {
        "wkt point"
    }

    fn read_value(&self, raw: &Value) -> Result<Value, MappingError> {
        match raw.untyped() {
            Value::Null => Ok(Value::Null),
            Value::Point(p) => Ok(Value::Point(*p)),
            Value::Text(s) => parse_wkt_point(s).map(Value::Point),
            other => Err(mismatch("wkt point", other)),
        }
    }

    fn write(&self, native: Value) -> Result<Value, MappingError> {
        match native.into_untyped() {
            Value::Null => Ok(Value::Null),
            Value::Point(p) => Ok(Value::Text(format_wkt_point(finite(p)?))),
            other => Err(mismatch("point", &other)),
        }
    }

    fn format_parameter(&self, param: &str) -> String {
        format!("ST_GeomFromText(:{param}, {})", self.srid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_wkt_and_ewkt() {
        assert_eq!(parse_wkt_point("POINT(2.35 48.85)").unwrap(), Point::new(2.35, 48.85));
        assert_eq!(
            parse_wkt_point("SRID=4326;POINT(-1 2e1)").unwrap(),
            Point::new(-1.0, 20.0)
        );
        assert_eq!(parse_wkt_point(" point ( 1 2 ) ").unwrap(), Point::new(1.0, 2.0));
        assert!(parse_wkt_point("LINESTRING(0 0, 1 1)").is_err());
        assert!(parse_wkt_point("POINT(1..2 3)").is_err());
    }

    #[test]
    fn test_wkt_placeholder_carries_srid() {
        assert_eq!(
            WktPointConverter::new(4326).format_parameter("location"),
            "ST_GeomFromText(:location, 4326)"
        );
    }

    #[test]
    fn test_pg_point_text_form() {
        let c = PgPointConverter;
        assert_eq!(
            c.write(Value::Point(Point::new(1.5, -2.0))).unwrap(),
            Value::typed("point", Value::from("(1.5,-2)"))
        );
        assert_eq!(
            c.read_value(&Value::from("(1.5,-2)")).unwrap(),
            Value::Point(Point::new(1.5, -2.0))
        );
        assert_eq!(c.format_parameter("p"), "(:p)::point");
    }

    #[test]
    fn test_non_finite_points_rejected_on_write() {
        let pg = PgPointConverter;
        let wkt = WktPointConverter::new(4326);
        for p in [
            Point::new(f64::NAN, 0.0),
            Point::new(0.0, f64::INFINITY),
            Point::new(f64::NEG_INFINITY, 1.0),
        ] {
            assert!(matches!(
                pg.write(Value::Point(p)),
                Err(MappingError::MalformedSpatial { .. })
            ));
            assert!(matches!(
                wkt.write(Value::Point(p)),
                Err(MappingError::MalformedSpatial { .. })
            ));
        }
    }

    proptest! {
        #[test]
        fn prop_wkt_round_trip(x in -1.0e9f64..1.0e9, y in -1.0e9f64..1.0e9) {
            let c = WktPointConverter::new(4326);
            let p = Value::Point(Point::new(x, y));
            prop_assert_eq!(c.read_value(&c.write(p.clone()).unwrap()).unwrap(), p);
        }

        #[test]
        fn prop_pg_point_round_trip(x in -1.0e9f64..1.0e9, y in -1.0e9f64..1.0e9) {
            let c = PgPointConverter;
            let p = Value::Point(Point::new(x, y));
            prop_assert_eq!(c.read_value(&c.write(p.clone()).unwrap()).unwrap(), p);
        }
    }
}
