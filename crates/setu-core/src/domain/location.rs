use serde::{Deserialize, Serialize};

pub const MAP_LINK_PLACEHOLDER: &str = "Location not provided";

const MAPS_BASE: &str = "https://maps.google.com/?q=";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        if !lat.is_finite() || !lng.is_finite() {
            return None;
        }
        if lat.abs() > 90.0 || lng.abs() > 180.0 {
            return None;
        }
        Some(Self { lat, lng })
    }
}

pub fn map_link(coordinates: Option<Coordinates>) -> String {
    match coordinates {
        Some(Coordinates { lat, lng }) => format!("{MAPS_BASE}{lat},{lng}"),
        None => MAP_LINK_PLACEHOLDER.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::{map_link, Coordinates, MAP_LINK_PLACEHOLDER};

    #[test]
    fn map_link_uses_shortest_decimal_form() {
        let coords = Coordinates::new(19.076, 72.8777).expect("coords");
        assert_eq!(
            map_link(Some(coords)),
            "https://maps.google.com/?q=19.076,72.8777"
        );
    }

    #[test]
    fn map_link_falls_back_to_placeholder() {
        assert_eq!(map_link(None), MAP_LINK_PLACEHOLDER);
    }

    #[test]
    fn coordinates_reject_out_of_range_values() {
        assert!(Coordinates::new(91.0, 0.0).is_none());
        assert!(Coordinates::new(0.0, -180.5).is_none());
        assert!(Coordinates::new(f64::NAN, 0.0).is_none());
        assert!(Coordinates::new(-33.8688, 151.2093).is_some());
    }
}
