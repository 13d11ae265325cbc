// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

/// Describes how OSM ways are converted into routable [Edges](crate::Edge).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Profile<'a> {
    /// Key of the tag holding the road class of a way, usually "highway".
    pub class_key: &'a str,

    /// Allowlist of road classes usable for routing, together with the
    /// average travel speed on them.
    ///
    /// Ways whose road class is not listed here are skipped entirely.
    pub road_classes: &'a [RoadClass<'a>],

    /// Array of OSM
    /// [access tags](https://wiki.openstreetmap.org/wiki/Key:access#Land-based_transportation)
    /// (in order from least to most specific) to consider when checking for road prohibitions.
    pub access: &'a [&'a str],

    /// Speed (km/h) assumed for road classes missing from [Profile::road_classes].
    /// Must be finite and positive.
    pub default_speed: f64,

    /// Segments shorter than this many kilometers are dropped during ingestion.
    pub min_segment_length: f64,
}

/// Average travel speed on ways with a specific road class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadClass<'a> {
    /// Value of the [Profile::class_key] tag, e.g. "motorway" or "residential".
    pub value: &'a str,

    /// Average speed in km/h. Must be finite and positive.
    pub speed: f64,
}

impl<'a> Profile<'a> {
    /// Returns the road class of a way, if it is present in the allowlist.
    pub fn road_class(&self, tags: &HashMap<String, String>) -> Option<&RoadClass<'a>> {
        let value = tags.get(self.class_key)?;
        self.road_classes.iter().find(|c| c.value == value)
    }

    /// Returns the average speed (km/h) for a road class, falling back to
    /// [Profile::default_speed]. The result is never zero for a valid profile.
    pub fn speed(&self, class: &str) -> f64 {
        self.road_classes
            .iter()
            .find_map(|c| if c.value == class { Some(c.speed) } else { None })
            .unwrap_or(self.default_speed)
    }

    /// Checks if the way is routable by looking at the most specific access tag
    /// present ([Profile::access]).
    pub fn is_allowed(&self, tags: &HashMap<String, String>) -> bool {
        match self
            .access
            .iter()
            .rev()
            .find_map(|&mode| tags.get(mode).map(|v| v.as_str()))
        {
            Some("no") | Some("private") => false,
            _ => true,
        }
    }

    /// Checks if a way may only be traversed in its stored node order.
    ///
    /// Only the exact value `oneway=yes` is recognized; `true`, `1` and `-1`
    /// leave the way bidirectional.
    pub fn is_one_way(&self, tags: &HashMap<String, String>) -> bool {
        tags.get("oneway").map(|v| v.as_str()) == Some("yes")
    }
}

/// Routing [Profile] for motor vehicles: the navigable road classes
/// with typical urban average speeds.
pub const CAR_PROFILE: Profile = Profile {
    class_key: "highway",
    road_classes: &[
        RoadClass {
            value: "motorway",
            speed: 80.0,
        },
        RoadClass {
            value: "trunk",
            speed: 70.0,
        },
        RoadClass {
            value: "primary",
            speed: 60.0,
        },
        RoadClass {
            value: "secondary",
            speed: 50.0,
        },
        RoadClass {
            value: "tertiary",
            speed: 40.0,
        },
        RoadClass {
            value: "unclassified",
            speed: 30.0,
        },
        RoadClass {
            value: "residential",
            speed: 30.0,
        },
        RoadClass {
            value: "living_street",
            speed: 10.0,
        },
        RoadClass {
            value: "service",
            speed: 20.0,
        },
        RoadClass {
            value: "road",
            speed: 30.0,
        },
        RoadClass {
            value: "primary_link",
            speed: 60.0,
        },
        RoadClass {
            value: "secondary_link",
            speed: 50.0,
        },
        RoadClass {
            value: "tertiary_link",
            speed: 40.0,
        },
    ],
    access: &["access"],
    default_speed: 20.0,
    min_segment_length: 0.001,
};

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! tags {
        {} => { HashMap::default() };
        {$( $k:literal : $v:literal ),+} => {
            HashMap::from_iter([ $( ($k.to_string(), $v.to_string()) ),+ ])
        };
    }

    #[test]
    fn road_class_allowlist() {
        let p = &CAR_PROFILE;
        assert_eq!(
            p.road_class(&tags! {"highway": "residential"}).map(|c| c.value),
            Some("residential")
        );
        assert_eq!(
            p.road_class(&tags! {"highway": "tertiary_link"}).map(|c| c.value),
            Some("tertiary_link")
        );
        assert!(p.road_class(&tags! {"highway": "footway"}).is_none());
        assert!(p.road_class(&tags! {"highway": "motorway_link"}).is_none());
        assert!(p.road_class(&tags! {"railway": "rail"}).is_none());
        assert!(p.road_class(&tags! {}).is_none());
    }

    #[test]
    fn speed_table() {
        let p = &CAR_PROFILE;
        assert_eq!(p.speed("motorway"), 80.0);
        assert_eq!(p.speed("trunk"), 70.0);
        assert_eq!(p.speed("primary"), 60.0);
        assert_eq!(p.speed("secondary"), 50.0);
        assert_eq!(p.speed("tertiary"), 40.0);
        assert_eq!(p.speed("unclassified"), 30.0);
        assert_eq!(p.speed("residential"), 30.0);
        assert_eq!(p.speed("service"), 20.0);
        assert_eq!(p.speed("road"), 30.0);
        assert_eq!(p.speed("living_street"), 10.0);
        assert_eq!(p.speed("primary_link"), 60.0);
        assert_eq!(p.speed("secondary_link"), 50.0);
        assert_eq!(p.speed("tertiary_link"), 40.0);
        assert_eq!(p.speed("track"), 20.0);
        assert_eq!(p.speed(""), 20.0);
    }

    #[test]
    fn speed_never_zero() {
        let p = &CAR_PROFILE;
        assert!(p.default_speed.is_normal() && p.default_speed > 0.0);
        for c in p.road_classes {
            assert!(c.speed.is_normal() && c.speed > 0.0, "{}", c.value);
        }
    }

    #[test]
    fn access() {
        let p = &CAR_PROFILE;
        assert!(p.is_allowed(&tags! {"highway": "primary"}));
        assert!(p.is_allowed(&tags! {"highway": "primary", "access": "yes"}));
        assert!(p.is_allowed(&tags! {"highway": "primary", "access": "destination"}));
        assert!(!p.is_allowed(&tags! {"highway": "primary", "access": "no"}));
        assert!(!p.is_allowed(&tags! {"highway": "primary", "access": "private"}));
    }

    #[test]
    fn one_way_is_strict() {
        let p = &CAR_PROFILE;
        assert!(p.is_one_way(&tags! {"oneway": "yes"}));
        assert!(!p.is_one_way(&tags! {"oneway": "true"}));
        assert!(!p.is_one_way(&tags! {"oneway": "1"}));
        assert!(!p.is_one_way(&tags! {"oneway": "-1"}));
        assert!(!p.is_one_way(&tags! {"oneway": "no"}));
        assert!(!p.is_one_way(&tags! {"junction": "roundabout"}));
    }
}
