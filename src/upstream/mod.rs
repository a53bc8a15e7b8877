//! Route table mapping each gateway route onto its upstream call.
//!
//! Every NASA service has its own path conventions, so instead of branching
//! per handler the gateway looks up a static [`RouteSpec`] and lets
//! [`UpstreamRoute::build`] apply defaults, validation and placement.

use crate::domain::UpstreamQuery;
use crate::errors::{ApiError, ApiResult};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Which upstream service a route talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// api.nasa.gov, keyed
    Nasa,
    /// images-api.nasa.gov, public
    MediaLibrary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Query,
    /// Replaces `{name}` in the path template
    PathSegment,
    /// Appended as `<prefix><value>` when present
    PathSuffix(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    Any,
    /// ASCII letters only, normalized to lowercase
    RoverName,
    /// Calendar date in YYYY-MM-DD form
    IsoDate,
}

impl Validation {
    fn apply(self, value: String) -> ApiResult<String> {
        match self {
            Validation::Any => Ok(value),
            Validation::RoverName => {
                if !value.is_empty() && value.bytes().all(|b| b.is_ascii_alphabetic()) {
                    Ok(value.to_ascii_lowercase())
                } else {
                    Err(ApiError::InvalidInput("Invalid rover".to_string()))
                }
            }
            Validation::IsoDate => match NaiveDate::parse_from_str(&value, "%Y-%m-%d") {
                Ok(_) if value.len() == 10 => Ok(value),
                _ => Err(ApiError::InvalidInput(
                    "Invalid date format, expected YYYY-MM-DD".to_string(),
                )),
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParamRule {
    pub name: &'static str,
    pub placement: Placement,
    pub default: Option<&'static str>,
    /// Message returned when the parameter is missing or empty
    pub required: Option<&'static str>,
    pub validation: Validation,
}

impl ParamRule {
    const fn query(name: &'static str) -> Self {
        Self {
            name,
            placement: Placement::Query,
            default: None,
            required: None,
            validation: Validation::Any,
        }
    }

    const fn with_default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    const fn required(mut self, message: &'static str) -> Self {
        self.required = Some(message);
        self
    }

    const fn placed(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    const fn validated(mut self, validation: Validation) -> Self {
        self.validation = validation;
        self
    }
}

#[derive(Debug)]
pub struct RouteSpec {
    pub name: &'static str,
    pub target: Target,
    pub path: &'static str,
    pub params: &'static [ParamRule],
    /// Label used as `error` in the envelope when the upstream call fails
    pub failure: &'static str,
}

static APOD: RouteSpec = RouteSpec {
    name: "apod",
    target: Target::Nasa,
    path: "/planetary/apod",
    params: &[ParamRule::query("date"), ParamRule::query("count")],
    failure: "Failed to fetch Astronomy Picture of the Day",
};

static MARS_PHOTOS: RouteSpec = RouteSpec {
    name: "mars-photos",
    target: Target::Nasa,
    path: "/mars-photos/api/v1/rovers/{rover}/photos",
    params: &[
        ParamRule::query("page").with_default("1"),
        ParamRule::query("sol"),
        ParamRule::query("camera"),
        ParamRule::query("rover")
            .with_default("curiosity")
            .placed(Placement::PathSegment)
            .validated(Validation::RoverName),
    ],
    failure: "Failed to fetch Mars rover photos",
};

static NEO: RouteSpec = RouteSpec {
    name: "neo",
    target: Target::Nasa,
    path: "/neo/rest/v1/feed",
    params: &[ParamRule::query("start_date"), ParamRule::query("end_date")],
    failure: "Failed to fetch Near Earth Objects",
};

static EPIC: RouteSpec = RouteSpec {
    name: "epic",
    target: Target::Nasa,
    path: "/EPIC/api/natural",
    params: &[ParamRule::query("date")
        .placed(Placement::PathSuffix("/date/"))
        .validated(Validation::IsoDate)],
    failure: "Failed to fetch Earth images",
};

static SEARCH_MEDIA: RouteSpec = RouteSpec {
    name: "search",
    target: Target::MediaLibrary,
    path: "",
    params: &[
        // Whitespace-only counts as missing here too, so `q=%20%20` is a 400
        // instead of a blank search forwarded upstream
        ParamRule::query("q").required("Search query is required"),
        ParamRule::query("media_type").with_default("image"),
        ParamRule::query("page").with_default("1"),
    ],
    failure: "Failed to search NASA media",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UpstreamRoute {
    Apod,
    MarsPhotos,
    Neo,
    Epic,
    SearchMedia,
}

/// A fully resolved upstream call
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    pub route: UpstreamRoute,
    pub target: Target,
    pub path: String,
    pub query: UpstreamQuery,
}

impl UpstreamRoute {
    pub const ALL: [UpstreamRoute; 5] = [
        UpstreamRoute::Apod,
        UpstreamRoute::MarsPhotos,
        UpstreamRoute::Neo,
        UpstreamRoute::Epic,
        UpstreamRoute::SearchMedia,
    ];

    pub fn spec(self) -> &'static RouteSpec {
        match self {
            UpstreamRoute::Apod => &APOD,
            UpstreamRoute::MarsPhotos => &MARS_PHOTOS,
            UpstreamRoute::Neo => &NEO,
            UpstreamRoute::Epic => &EPIC,
            UpstreamRoute::SearchMedia => &SEARCH_MEDIA,
        }
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.name() == name)
    }

    /// Resolve raw client parameters into an upstream call.
    ///
    /// Defaults are applied before validation, empty values count as absent
    /// and keys the table does not know are dropped.
    pub fn build(self, raw: &HashMap<String, String>) -> ApiResult<UpstreamRequest> {
        let spec = self.spec();
        let mut path = spec.path.to_string();
        let mut query = UpstreamQuery::new();

        for rule in spec.params {
            let provided = raw
                .get(rule.name)
                .filter(|v| !v.trim().is_empty())
                .cloned();

            let value = match provided.or_else(|| rule.default.map(str::to_string)) {
                Some(v) => v,
                None => match rule.required {
                    Some(message) => return Err(ApiError::InvalidInput(message.to_string())),
                    None => continue,
                },
            };
            let value = rule.validation.apply(value)?;

            match rule.placement {
                Placement::Query => query.push(rule.name, value),
                Placement::PathSegment => {
                    path = path.replace(&format!("{{{}}}", rule.name), &value);
                }
                Placement::PathSuffix(prefix) => {
                    path.push_str(prefix);
                    path.push_str(&value);
                }
            }
        }

        Ok(UpstreamRequest {
            route: self,
            target: spec.target,
            path,
            query,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_mars_photos_defaults_for_every_rover() {
        for rover in ["curiosity", "opportunity", "spirit"] {
            let req = UpstreamRoute::MarsPhotos
                .build(&params(&[("rover", rover)]))
                .unwrap();
            assert_eq!(
                req.path,
                format!("/mars-photos/api/v1/rovers/{}/photos", rover)
            );
            assert_eq!(req.query.get("page"), Some("1"));
            assert!(!req.query.contains("camera"));
            assert!(!req.query.contains("rover"));
        }
    }

    #[test]
    fn test_mars_photos_defaults_to_curiosity_and_orders_query() {
        let req = UpstreamRoute::MarsPhotos
            .build(&params(&[("sol", "1000"), ("camera", "")]))
            .unwrap();
        assert_eq!(req.path, "/mars-photos/api/v1/rovers/curiosity/photos");
        assert_eq!(req.query.keys().collect::<Vec<_>>(), vec!["page", "sol"]);
    }

    #[test]
    fn test_mars_photos_rejects_path_tricks() {
        let err = UpstreamRoute::MarsPhotos
            .build(&params(&[("rover", "../../planetary")]))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(ref m) if m == "Invalid rover"));
    }

    #[test]
    fn test_rover_name_is_lowercased() {
        let req = UpstreamRoute::MarsPhotos
            .build(&params(&[("rover", "Spirit")]))
            .unwrap();
        assert_eq!(req.path, "/mars-photos/api/v1/rovers/spirit/photos");
    }

    #[test]
    fn test_apod_passes_through_only_known_keys() {
        let req = UpstreamRoute::Apod
            .build(&params(&[("date", "2024-01-01"), ("api_key", "stolen")]))
            .unwrap();
        assert_eq!(req.path, "/planetary/apod");
        assert_eq!(req.query.keys().collect::<Vec<_>>(), vec!["date"]);

        let empty = UpstreamRoute::Apod.build(&HashMap::new()).unwrap();
        assert!(empty.query.is_empty());
    }

    #[test]
    fn test_epic_date_becomes_path_suffix() {
        let base = UpstreamRoute::Epic.build(&HashMap::new()).unwrap();
        assert_eq!(base.path, "/EPIC/api/natural");

        let dated = UpstreamRoute::Epic
            .build(&params(&[("date", "2023-06-01")]))
            .unwrap();
        assert_eq!(dated.path, "/EPIC/api/natural/date/2023-06-01");
        assert!(dated.query.is_empty());
    }

    #[test]
    fn test_epic_rejects_malformed_dates() {
        for bad in ["2023-13-01", "yesterday", "2023-6-1", "2023-06-01/../x"] {
            let err = UpstreamRoute::Epic
                .build(&params(&[("date", bad)]))
                .unwrap_err();
            assert!(matches!(err, ApiError::InvalidInput(_)), "{}", bad);
        }
    }

    #[test]
    fn test_search_requires_query() {
        for raw in [params(&[]), params(&[("q", "")]), params(&[("q", "   ")])] {
            let err = UpstreamRoute::SearchMedia.build(&raw).unwrap_err();
            assert!(matches!(err, ApiError::InvalidInput(ref m) if m == "Search query is required"));
        }
    }

    #[test]
    fn test_search_defaults() {
        let req = UpstreamRoute::SearchMedia
            .build(&params(&[("q", "apollo 11")]))
            .unwrap();
        assert_eq!(req.target, Target::MediaLibrary);
        assert_eq!(
            req.query.as_pairs().to_vec(),
            vec![
                ("q".to_string(), "apollo 11".to_string()),
                ("media_type".to_string(), "image".to_string()),
                ("page".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_route_names_round_trip() {
        for route in UpstreamRoute::ALL {
            assert_eq!(UpstreamRoute::from_name(route.name()), Some(route));
        }
        assert_eq!(UpstreamRoute::from_name("donki"), None);
    }
}
