//! Query template construction.

use std::fmt;

use super::{BBOX_TOKEN, MVT_EXTENT, MVT_GEOMETRY_COLUMN};
use crate::layers::{Layer, LayerSpec};

/// Column carrying each layer's position, used to pin the union's row order.
const ORDINAL_COLUMN: &str = "layer_ordinal";

/// SQL template covering every layer of a [`LayerSpec`].
///
/// Each layer contributes one `ST_AsMVT` aggregate; the per-layer statements
/// are joined with `UNION ALL` and ordered by layer position. The template
/// holds only placeholder tokens, never per-request values, so a single
/// instance is shared read-only by all requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate {
    sql: String,
    layer_count: usize,
}

impl QueryTemplate {
    /// Build the template for a layer specification.
    ///
    /// # Example
    ///
    /// ```
    /// use postserve::layers::LayerSpec;
    /// use postserve::query::QueryTemplate;
    ///
    /// let spec = LayerSpec::from_yaml_str(r#"
    /// Layer:
    ///   - id: water
    ///     properties: { buffer-size: 4 }
    ///     Datasource: { table: "(SELECT geometry, class FROM water) AS t" }
    /// "#).unwrap();
    ///
    /// let template = QueryTemplate::build(&spec);
    /// assert!(template.as_str().starts_with("SELECT ST_AsMVT(tile, 'water', 4096, 'mvtgeometry')"));
    /// assert!(template.as_str().ends_with(';'));
    /// ```
    pub fn build(spec: &LayerSpec) -> Self {
        let statements: Vec<String> = spec
            .layers()
            .iter()
            .enumerate()
            .map(|(ordinal, layer)| layer_statement(ordinal, layer))
            .collect();

        let sql = format!(
            "{} ORDER BY {};",
            statements.join(" UNION ALL "),
            ORDINAL_COLUMN
        );

        Self {
            sql,
            layer_count: statements.len(),
        }
    }

    /// The template SQL, placeholders included.
    pub fn as_str(&self) -> &str {
        &self.sql
    }

    /// Number of layers (and therefore result rows) in the template.
    pub fn layer_count(&self) -> usize {
        self.layer_count
    }
}

impl fmt::Display for QueryTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Build the statement for one layer.
///
/// The geometry projection item is replaced by its clipped, tile-space
/// version; rows whose geometry falls outside the buffered tile clip to NULL
/// and are filtered before encoding.
fn layer_statement(ordinal: usize, layer: &Layer) -> String {
    let fragment = layer.fragment();

    let clipped = format!(
        "ST_AsMVTGeom({}, {}, {}, {}, true) AS {}",
        fragment.geometry_expr(),
        BBOX_TOKEN,
        MVT_EXTENT,
        layer.buffer_size(),
        MVT_GEOMETRY_COLUMN
    );

    let projection: Vec<&str> = fragment
        .projection()
        .iter()
        .enumerate()
        .map(|(i, item)| {
            if i == fragment.geometry_index() {
                clipped.as_str()
            } else {
                item.as_str()
            }
        })
        .collect();

    format!(
        "SELECT ST_AsMVT(tile, {name}, {extent}, '{geom}') AS mvt, {ordinal} AS {ordinal_col} \
         FROM (SELECT {projection} {from}) AS tile \
         WHERE tile.{geom} IS NOT NULL",
        name = sql_literal(layer.id()),
        extent = MVT_EXTENT,
        geom = MVT_GEOMETRY_COLUMN,
        ordinal = ordinal,
        ordinal_col = ORDINAL_COLUMN,
        projection = projection.join(", "),
        from = fragment.from_clause(),
    )
}

/// Quote a value as a SQL string literal.
fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::TOKENS;

    fn spec(yaml: &str) -> LayerSpec {
        LayerSpec::from_yaml_str(yaml).unwrap()
    }

    const WATER_AND_ROADS: &str = r#"
Layer:
  - id: water
    properties: { buffer-size: 4 }
    Datasource: { table: "(SELECT geometry, class FROM layer_water(!bbox!, z(!scale_denominator!))) AS t" }
  - id: roads
    properties: { buffer-size: 8 }
    Datasource: { table: "(SELECT name, geometry FROM roads WHERE width > !pixel_width!) AS t" }
"#;

    #[test]
    fn test_single_layer_statement() {
        let template = QueryTemplate::build(&spec(
            r#"
Layer:
  - id: water
    properties: { buffer-size: 4 }
    Datasource: { table: "(SELECT geometry, class FROM water) AS t" }
"#,
        ));

        assert_eq!(
            template.as_str(),
            "SELECT ST_AsMVT(tile, 'water', 4096, 'mvtgeometry') AS mvt, 0 AS layer_ordinal \
             FROM (SELECT ST_AsMVTGeom(geometry, !bbox!, 4096, 4, true) AS mvtgeometry, class FROM water) AS tile \
             WHERE tile.mvtgeometry IS NOT NULL ORDER BY layer_ordinal;"
        );
        assert_eq!(template.layer_count(), 1);
    }

    #[test]
    fn test_layers_joined_in_order() {
        let template = QueryTemplate::build(&spec(WATER_AND_ROADS));
        let sql = template.as_str();

        assert_eq!(template.layer_count(), 2);
        assert_eq!(sql.matches(" UNION ALL ").count(), 1);

        let water = sql.find("'water'").unwrap();
        let roads = sql.find("'roads'").unwrap();
        assert!(water < roads);
        assert!(sql.contains("1 AS layer_ordinal"));
        assert!(sql.ends_with(" ORDER BY layer_ordinal;"));
    }

    #[test]
    fn test_buffer_size_per_layer() {
        let sql = QueryTemplate::build(&spec(WATER_AND_ROADS)).to_string();

        assert!(sql.contains("ST_AsMVTGeom(geometry, !bbox!, 4096, 4, true)"));
        assert!(sql.contains("ST_AsMVTGeom(geometry, !bbox!, 4096, 8, true)"));
    }

    #[test]
    fn test_geometry_rewritten_in_place() {
        let sql = QueryTemplate::build(&spec(WATER_AND_ROADS)).to_string();

        // roads projects geometry second; the position is kept
        assert!(sql.contains(
            "SELECT name, ST_AsMVTGeom(geometry, !bbox!, 4096, 8, true) AS mvtgeometry FROM roads"
        ));
        // references outside the projection are untouched
        assert!(sql.contains("WHERE width > !pixel_width!"));
    }

    #[test]
    fn test_aliased_geometry_expression() {
        let template = QueryTemplate::build(&spec(
            r#"
Layer:
  - id: place
    properties: { buffer-size: 256 }
    Datasource: { table: "(SELECT ST_PointOnSurface(way) AS geometry, name FROM places) AS t" }
"#,
        ));

        assert!(template.as_str().contains(
            "SELECT ST_AsMVTGeom(ST_PointOnSurface(way), !bbox!, 4096, 256, true) AS mvtgeometry, name FROM places"
        ));
    }

    #[test]
    fn test_template_holds_only_tokens() {
        let template = QueryTemplate::build(&spec(WATER_AND_ROADS));
        let sql = template.as_str();

        assert!(TOKENS.iter().any(|t| sql.contains(t)));
        assert!(!sql.contains("ST_MakeBox2D"));
    }

    #[test]
    fn test_sql_literal_doubles_quotes() {
        assert_eq!(sql_literal("water"), "'water'");
        assert_eq!(sql_literal("it's"), "'it''s'");
    }
}
