//! Earth Engine expression graphs.
//!
//! The REST API accepts computations as a graph of function invocations
//! (`{"result": "0", "values": {"0": {...}}}`). The builders here produce the
//! two graphs the dashboard needs: a clipped NDVI image and the mean tree
//! cover over a buffer.

use crate::config::EarthEngineConfig;
use crate::models::GeoPoint;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Name of the band produced by the NDVI graph
pub const NDVI_BAND: &str = "NDVI";
const MAX_PIXELS: f64 = 1e9;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueNode {
    ConstantValue(Value),
    FunctionInvocationValue(FunctionInvocation),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionInvocation {
    pub function_name: String,
    pub arguments: BTreeMap<String, ValueNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expression {
    pub result: String,
    pub values: BTreeMap<String, ValueNode>,
}

impl Expression {
    /// Single-node graph whose result is `root`
    #[must_use]
    pub fn from_root(root: ValueNode) -> Self {
        Self {
            result: "0".to_string(),
            values: BTreeMap::from([("0".to_string(), root)]),
        }
    }
}

pub fn constant(value: impl Into<Value>) -> ValueNode {
    ValueNode::ConstantValue(value.into())
}

pub fn invoke<'a>(
    function_name: &str,
    arguments: impl IntoIterator<Item = (&'a str, ValueNode)>,
) -> ValueNode {
    ValueNode::FunctionInvocationValue(FunctionInvocation {
        function_name: function_name.to_string(),
        arguments: arguments
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect(),
    })
}

/// Circle of `meters` around `point`
#[must_use]
pub fn point_buffer(point: GeoPoint, meters: f64) -> ValueNode {
    let geometry = invoke(
        "GeometryConstructors.Point",
        [(
            "coordinates",
            constant(serde_json::json!([point.longitude, point.latitude])),
        )],
    );
    invoke(
        "Geometry.buffer",
        [("geometry", geometry), ("distance", constant(meters))],
    )
}

/// Least cloudy image of the configured collection and date range, reduced
/// to a normalized difference of the NIR and red bands and clipped to
/// `buffer`
#[must_use]
pub fn ndvi_image(config: &EarthEngineConfig, buffer: &ValueNode) -> ValueNode {
    let collection = invoke(
        "ImageCollection.load",
        [("id", constant(config.imagery_collection.as_str()))],
    );
    let in_bounds = invoke(
        "Collection.filter",
        [
            ("collection", collection),
            (
                "filter",
                invoke(
                    "Filter.intersects",
                    [("leftField", constant(".all")), ("rightValue", buffer.clone())],
                ),
            ),
        ],
    );
    let date_range = invoke(
        "DateRange",
        [
            ("start", constant(config.imagery_start.to_string())),
            ("end", constant(config.imagery_end.to_string())),
        ],
    );
    let in_range = invoke(
        "Collection.filter",
        [
            ("collection", in_bounds),
            (
                "filter",
                invoke(
                    "Filter.dateRangeContains",
                    [
                        ("leftValue", date_range),
                        ("rightField", constant("system:time_start")),
                    ],
                ),
            ),
        ],
    );
    let sorted = invoke(
        "Collection.limit",
        [
            ("collection", in_range),
            ("key", constant(config.cloud_property.as_str())),
            ("ascending", constant(true)),
        ],
    );
    let least_cloudy = invoke("Collection.first", [("collection", sorted)]);
    let ndvi = invoke(
        "Image.normalizedDifference",
        [
            ("input", least_cloudy),
            (
                "bandNames",
                constant(vec![config.nir_band.clone(), config.red_band.clone()]),
            ),
        ],
    );
    let renamed = invoke(
        "Image.rename",
        [("input", ndvi), ("names", constant(vec![NDVI_BAND]))],
    );
    invoke(
        "Image.clip",
        [("input", renamed), ("geometry", buffer.clone())],
    )
}

/// Mean of the tree cover band over `buffer`
#[must_use]
pub fn tree_cover_mean(config: &EarthEngineConfig, buffer: &ValueNode) -> ValueNode {
    let collection = invoke(
        "ImageCollection.load",
        [("id", constant(config.tree_cover_collection.as_str()))],
    );
    let first = invoke("Collection.first", [("collection", collection)]);
    let band = invoke(
        "Image.select",
        [
            ("input", first),
            (
                "bandSelectors",
                constant(vec![config.tree_cover_band.clone()]),
            ),
        ],
    );
    let clipped = invoke(
        "Image.clip",
        [("input", band), ("geometry", buffer.clone())],
    );
    invoke(
        "Image.reduceRegion",
        [
            ("image", clipped),
            ("reducer", invoke("Reducer.mean", std::iter::empty::<(&str, ValueNode)>())),
            ("geometry", buffer.clone()),
            ("scale", constant(config.tree_cover_scale)),
            ("maxPixels", constant(MAX_PIXELS)),
        ],
    )
}
