//! Converters for the types engines disagree on.

mod composite;
mod enumeration;
mod json;
mod spatial;
mod uuids;

pub use self::composite::{CompositeConverter, encode_composite, parse_composite};
pub use self::enumeration::EnumConverter;
pub use self::json::{JsonConverter, JsonStyle};
pub use self::spatial::{PgPointConverter, WktPointConverter, format_wkt_point, parse_wkt_point};
pub use self::uuids::{UuidConverter, UuidStyle};
