use std::any::TypeId;
use std::sync::Arc;

use relmap::converters::{encode_composite, parse_composite};
use relmap::prelude::*;
use relmap::{ConverterRef, PassThrough, Point, TypeRegistry};

relmap::sql_enum! {
    pub enum Mood: "mood" {
        Happy => "HAPPY",
        Grumpy => "GRUMPY",
    }
}

relmap::composite_type! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct CityPair {
        first: Option<String>,
        second: Option<String>,
    }
}

/// Answers only for the listed types, with a converter named after itself.
#[derive(Debug)]
struct Selective {
    name: &'static str,
    handles: Vec<TypeId>,
    registry: TypeRegistry,
}

impl Selective {
    fn arc(name: &'static str, handles: Vec<TypeId>) -> Arc<dyn Dialect> {
        Arc::new(Self {
            name,
            handles,
            registry: TypeRegistry::new(),
        })
    }
}

impl Dialect for Selective {
    fn name(&self) -> &'static str {
        self.name
    }

    fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    fn resolve(&self, ty: &TypeInfo) -> std::result::Result<Option<ConverterRef>, ConfigError> {
        Ok(self
            .handles
            .contains(&ty.id())
            .then(|| Arc::new(PassThrough::new(self.name)) as ConverterRef))
    }
}

#[test]
fn test_most_specific_link_wins_and_fallback_reaches_last() {
    let chain = DialectChain::new([
        Selective::arc("a", vec![TypeId::of::<i32>()]),
        Selective::arc("b", vec![TypeId::of::<i32>(), TypeId::of::<String>()]),
        Selective::arc("c", vec![TypeId::of::<Point>()]),
    ]);

    let name = |ty: TypeInfo| chain.converter_for(&ty).unwrap().name();
    assert_eq!(name(i32::type_info()), "a");
    assert_eq!(name(String::type_info()), "b");
    assert_eq!(name(Point::type_info()), "c");
    assert!(matches!(
        chain.converter_for(&bool::type_info()),
        Err(ConfigError::UnsupportedType { ref chain, .. }) if chain == "a -> b -> c"
    ));
}

#[test]
fn test_declared_enum_memoized_with_identical_formatting() {
    let chain = Engine::Postgres.chain(4326);
    let postgres = &chain.links()[0];
    assert_eq!(postgres.registry().enum_type(TypeId::of::<Mood>()), None);

    let first = chain.converter_for(&Mood::type_info()).unwrap();
    assert_eq!(
        postgres.registry().enum_type(TypeId::of::<Mood>()).as_deref(),
        Some("mood")
    );
    let second = chain.converter_for(&Mood::type_info()).unwrap();

    assert_eq!(first.format_parameter("m"), "(:m)::mood");
    assert_eq!(first.format_parameter("m"), second.format_parameter("m"));
    assert_eq!(
        first.write(Value::from("HAPPY")).unwrap(),
        second.write(Value::from("HAPPY")).unwrap()
    );
}

#[test]
fn test_explicit_enum_registration_overrides_declaration() {
    let chain = Engine::Postgres.chain(4326);
    chain.register_enum::<Mood>("feeling");
    let converter = chain.converter_for(&Mood::type_info()).unwrap();
    assert_eq!(converter.format_parameter("m"), "(:m)::feeling");
}

#[test]
fn test_enum_filter_renders_cast() {
    let chain = Engine::Postgres.chain(4326);
    let statement = Select::from("users")
        .filter(Condition::typed("mood", Op::Eq, &Mood::Grumpy).unwrap())
        .render(&chain)
        .unwrap();
    assert!(statement.sql.ends_with(r#"WHERE "users"."mood" = (:p1)::mood"#));
}

#[test]
fn test_composite_round_trip_with_empty_field() {
    let chain = Engine::Postgres.chain(4326);
    chain.register_composite::<CityPair>("city_pair");
    let converter = chain.composite_converter(&CityPair::type_info()).unwrap();

    let pair = CityPair {
        first: Some("Paris".into()),
        second: None,
    };
    let written = converter.write(pair.to_value().unwrap()).unwrap();
    assert_eq!(
        written,
        Value::typed("city_pair", Value::from("(\"Paris\",)"))
    );
    assert_eq!(converter.format_parameter("pair"), "(:pair)::city_pair");

    let read = converter.read_value(&written).unwrap();
    assert_eq!(CityPair::from_value(read).unwrap(), pair);
}

#[test]
fn test_composite_text_helpers_agree() {
    let fields = vec![Value::from("a \"quoted\" \\ city"), Value::Null];
    let text = encode_composite(&fields).unwrap();
    assert_eq!(parse_composite(&text).unwrap(), fields);
}

#[test]
fn test_unregistered_composite_is_not_configured() {
    let chain = Engine::Postgres.chain(4326);
    assert!(matches!(
        chain.composite_converter(&CityPair::type_info()),
        Err(ConfigError::TypeNotConfigured { .. })
    ));
}

#[test]
fn test_mysql_composite_fails_fast() {
    let chain = Engine::MySql.chain(4326);
    chain.register_composite::<CityPair>("city_pair");
    let err = chain.converter_for(&CityPair::type_info()).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Unsupported { engine: "mysql", .. }
    ));
}

#[derive(Debug, Default)]
struct Trip {
    id: i64,
    cities: Option<CityPair>,
}

impl Entity for Trip {
    const TABLE_NAME: &'static str = "trips";

    fn describe(b: &mut EntityBuilder<Self>) {
        b.field("id", |t| &t.id, |t| &mut t.id);
        b.optional("cities", |t| &t.cities, |t| &mut t.cities);
    }
}

#[test]
fn test_mysql_entity_with_composite_fails_at_registration() {
    let chain = Engine::MySql.chain(4326);
    chain.register_composite::<CityPair>("city_pair");
    let db = Database::with_chain(
        NoRows,
        chain,
        DatabaseConfig::default().engine(Engine::MySql),
    );
    let err = db.register::<Trip>().unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::Unsupported { feature: "composite types", .. })
    ));
}

#[test]
fn test_postgis_points_use_wkt_with_srid() {
    let chain = Engine::Postgis.chain(3857);
    let converter = chain.converter_for(&Point::type_info()).unwrap();
    assert_eq!(converter.format_parameter("at"), "ST_GeomFromText(:at, 3857)");

    let written = converter.write(Point::new(1.5, -2.0).to_value().unwrap()).unwrap();
    let read = converter.read_value(&written).unwrap();
    assert_eq!(Point::from_value(read).unwrap(), Point::new(1.5, -2.0));
}

#[test]
fn test_mysql_quotes_with_backticks() {
    let statement = Select::from("users")
        .columns(["id"])
        .render(&Engine::MySql.chain(4326))
        .unwrap();
    assert_eq!(statement.sql, "SELECT `users`.`id` AS `id` FROM `users`");
}

struct NoRows;

impl Connection for NoRows {
    fn query(&self, _statement: &Statement) -> Result<Vec<Row>> {
        Ok(Vec::new())
    }

    fn execute(&self, _statement: &Statement) -> Result<u64> {
        Ok(0)
    }
}
