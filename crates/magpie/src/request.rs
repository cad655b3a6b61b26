//! Validation of raw suggest request parameters.
//!
//! Parameters arrive as decoded key/value pairs, the way a query string
//! would deliver them. Every problem found is reported, not just the first.

use magpie_config::Settings;
use magpie_index::{BBox, CollectionRef, Srid};
use thiserror::Error;

/// Prefix every accepted CRS URI starts with.
pub const CRS_URI_PREFIX: &str = "http://www.opengis.net/def/crs/";

/// OGC code for WGS84 with lon/lat axis order.
const CRS84_CODE: &str = "CRS84";

/// Free-text search parameter.
const QUERY_PARAM: &str = "q";
/// Result count parameter.
const LIMIT_PARAM: &str = "limit";
/// Output CRS parameter.
const CRS_PARAM: &str = "crs";
/// Output format parameter; accepted and passed through.
const FORMAT_PARAM: &str = "f";
/// Search box parameter, `minx,miny,maxx,maxy`.
const BBOX_PARAM: &str = "bbox";
/// CRS of the search box.
const BBOX_CRS_PARAM: &str = "bbox-crs";
/// Required collection property.
const VERSION_KEY: &str = "version";
/// Optional collection property weighting its hits.
const RELEVANCE_KEY: &str = "relevance";

/// Reference systems a caller may request.
const SUPPORTED_SRIDS: [Srid; 3] = [Srid::Wgs84, Srid::WebMercator, Srid::RdNew];

/// Appended to collection errors.
const COLLECTION_HINT: &str = "specify at least one collection and version. For example: \
     'foo[version]=1' where 'foo' is the collection and '1' the version";

/// A request the caller has to correct.
///
/// Each message is meant for the caller as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .0.join("; "))]
pub struct ValidationError(pub Vec<String>);

impl ValidationError {
    /// Creates an error with a single message.
    pub fn single(message: impl Into<String>) -> Self {
        Self(vec![message.into()])
    }

    /// The individual problems, in the order they were found.
    pub fn messages(&self) -> &[String] {
        &self.0
    }
}

/// A validated suggest request.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestParams {
    /// Search text, trimmed and lower-cased.
    pub query: String,
    /// Collections to search, in the order first given.
    pub collections: Vec<CollectionRef>,
    /// Maximum number of results, already clamped.
    pub limit: usize,
    /// Reference system for result bounding boxes.
    pub srid: Srid,
    /// Search box, converted to WGS84.
    pub bbox: Option<BBox>,
    /// Requested output format, if any.
    pub format: Option<String>,
}

/// A collection seen in the request, before its version is checked.
struct RawCollection {
    /// Collection name.
    name: String,
    /// Raw `version` value, if given.
    version: Option<String>,
    /// Raw `relevance` value, if given.
    relevance: Option<String>,
}

impl SuggestParams {
    /// Validates raw query parameters.
    ///
    /// Collections use deep-object keys, e.g. `addresses[version]=3` and
    /// optionally `addresses[relevance]=0.8`. For repeated plain parameters
    /// the first value wins.
    pub fn from_pairs<I, K, V>(pairs: I, settings: &Settings) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut errors = Vec::new();
        let mut query = None;
        let mut limit = None;
        let mut crs = None;
        let mut format = None;
        let mut bbox = None;
        let mut bbox_crs = None;
        let mut collections: Vec<RawCollection> = Vec::new();
        let mut unknown = Vec::new();

        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            let slot = match key {
                QUERY_PARAM => &mut query,
                LIMIT_PARAM => &mut limit,
                CRS_PARAM => &mut crs,
                FORMAT_PARAM => &mut format,
                BBOX_PARAM => &mut bbox,
                BBOX_CRS_PARAM => &mut bbox_crs,
                _ => {
                    match split_deep_object(key) {
                        Some((name, property)) => {
                            collect_property(&mut collections, name, property, value, &mut errors);
                        }
                        None => unknown.push(key.to_string()),
                    }
                    continue;
                }
            };
            if slot.is_none() {
                *slot = Some(value.to_string());
            }
        }

        if !unknown.is_empty() {
            errors.insert(
                0,
                format!("unknown query parameter(s) found: {}", unknown.join(", ")),
            );
        }

        let collections = parse_collections(collections, &mut errors);
        let query = parse_query(query.as_deref()).map_err(|e| errors.push(e)).ok();
        let limit = parse_limit(limit.as_deref(), settings)
            .map_err(|e| errors.push(e))
            .ok();
        let srid = parse_crs(CRS_PARAM, crs.as_deref())
            .map_err(|e| errors.push(e))
            .ok();
        let bbox = parse_bbox(bbox.as_deref(), bbox_crs.as_deref())
            .map_err(|e| errors.push(e))
            .ok();

        match (query, limit, srid, bbox) {
            (Some(query), Some(limit), Some(srid), Some(bbox)) if errors.is_empty() => Ok(Self {
                query,
                collections,
                limit,
                srid,
                bbox,
                format,
            }),
            _ => Err(ValidationError(errors)),
        }
    }
}

/// Splits `name[property]` into its parts. Both must be word characters.
fn split_deep_object(key: &str) -> Option<(&str, &str)> {
    let (name, rest) = key.split_once('[')?;
    let property = rest.strip_suffix(']')?;
    let is_word = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_');
    (is_word(name) && is_word(property)).then_some((name, property))
}

/// Records one deep-object property against its collection.
fn collect_property(
    collections: &mut Vec<RawCollection>,
    name: &str,
    property: &str,
    value: &str,
    errors: &mut Vec<String>,
) {
    let index = match collections.iter().position(|c| c.name == name) {
        Some(index) => index,
        None => {
            collections.push(RawCollection {
                name: name.to_string(),
                version: None,
                relevance: None,
            });
            collections.len() - 1
        }
    };

    let entry = &mut collections[index];
    let slot = match property {
        VERSION_KEY => &mut entry.version,
        RELEVANCE_KEY => &mut entry.relevance,
        _ => {
            errors.push(format!(
                "unknown property '{property}' for collection {name}, \
                 only '{VERSION_KEY}' and '{RELEVANCE_KEY}' are supported"
            ));
            return;
        }
    };
    if slot.is_none() && !value.trim().is_empty() {
        *slot = Some(value.trim().to_string());
    }
}

/// Checks that at least one collection was given, each with a valid version.
fn parse_collections(raw: Vec<RawCollection>, errors: &mut Vec<String>) -> Vec<CollectionRef> {
    if raw.is_empty() {
        errors.push(format!(
            "no collection(s) specified in request, {COLLECTION_HINT}"
        ));
        return Vec::new();
    }

    let mut collections = Vec::with_capacity(raw.len());
    for RawCollection {
        name,
        version,
        relevance,
    } in raw
    {
        let Some(version) = version else {
            errors.push(format!(
                "no version specified in request for collection {name}, {COLLECTION_HINT}"
            ));
            continue;
        };
        match version.parse::<u64>() {
            Ok(version) => {
                let relevance = parse_relevance(relevance.as_deref());
                collections.push(CollectionRef::new(name, version).with_relevance(relevance));
            }
            Err(_) if version.parse::<i64>().is_ok() => {
                errors.push(format!("version of collection {name} can't be negative"));
            }
            Err(_) => errors.push(format!(
                "version of collection {name} must be numeric, got: {version}"
            )),
        }
    }
    collections
}

/// Reads a collection relevance. Values that are not a number in `0..=1`
/// fall back to the default.
fn parse_relevance(raw: Option<&str>) -> f32 {
    raw.and_then(|r| r.parse::<f32>().ok())
        .filter(|r| (0.0..=1.0).contains(r))
        .unwrap_or(CollectionRef::DEFAULT_RELEVANCE)
}

/// Normalises the search text and rejects boolean operators.
fn parse_query(raw: Option<&str>) -> Result<String, String> {
    let query = raw.unwrap_or_default().trim().to_lowercase();
    if query.is_empty() {
        return Err(format!(
            "no search terms provided, '{QUERY_PARAM}' query parameter is required"
        ));
    }
    if query.contains(['&', '|', '!']) || query.contains("<->") {
        return Err("provided search terms contain one or more boolean operators such as \
                    & (AND), | (OR), ! (NOT) which aren't allowed"
            .to_string());
    }
    Ok(query)
}

/// Parses the limit, clamping values above the configured maximum.
fn parse_limit(raw: Option<&str>, settings: &Settings) -> Result<usize, String> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(settings.default_limit),
        Some(raw) => raw,
    };
    match raw.parse::<i64>() {
        Ok(limit) if limit < 0 => Err("limit can't be negative".to_string()),
        Ok(limit) => Ok(usize::try_from(limit)
            .unwrap_or(usize::MAX)
            .min(settings.max_limit)),
        // Too large for i64 but still a plain number.
        Err(_) if raw.chars().all(|c| c.is_ascii_digit()) => Ok(settings.max_limit),
        Err(_) => Err("limit must be numeric".to_string()),
    }
}

/// Resolves the CRS URI given as `param` to a supported reference system.
fn parse_crs(param: &str, raw: Option<&str>) -> Result<Srid, String> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(Srid::Wgs84),
        Some(raw) => raw,
    };
    if !raw.starts_with(CRS_URI_PREFIX) {
        return Err(format!(
            "{param} param should start with {CRS_URI_PREFIX}, got: {raw}"
        ));
    }
    let code = raw.rsplit('/').next().unwrap_or_default();
    if code == CRS84_CODE {
        return Ok(Srid::Wgs84);
    }
    let numeric: u32 = code
        .parse()
        .map_err(|_| format!("expected numerical CRS code, received: {code}"))?;
    Srid::from_code(numeric).ok_or_else(|| {
        let supported: Vec<String> = SUPPORTED_SRIDS.iter().map(|s| s.code().to_string()).collect();
        format!(
            "unsupported CRS code {numeric}, supported codes are {}",
            supported.join(", ")
        )
    })
}

/// Parses `minx,miny,maxx,maxy` in the CRS named by `raw_crs` and converts
/// it to WGS84.
fn parse_bbox(raw: Option<&str>, raw_crs: Option<&str>) -> Result<Option<BBox>, String> {
    let srid = parse_crs(BBOX_CRS_PARAM, raw_crs)?;
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(raw) => raw,
    };
    let values: Vec<&str> = raw.split(',').collect();
    if values.len() != 4 {
        return Err(format!(
            "{BBOX_PARAM} should contain exactly 4 values separated by commas: minx,miny,maxx,maxy"
        ));
    }
    let mut coords = [0.0; 4];
    for (coord, value) in coords.iter_mut().zip(&values) {
        *coord = value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("failed to parse value {value} in {BBOX_PARAM}"))?;
    }
    let [min_x, min_y, max_x, max_y] = coords;
    let bbox = BBox {
        min_x,
        min_y,
        max_x,
        max_y,
    };
    if !bbox.has_area() {
        return Err(format!("{BBOX_PARAM} has no surface area"));
    }
    Ok(Some(bbox.to_wgs84(srid)))
}
