use geo::Point;
use std::fmt;

/// A merchant promotion pinned to a fixed location.
#[derive(Debug, Clone, PartialEq)]
pub struct Offer {
    pub key: String,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub coordinate: Point,
}

impl Offer {
    pub fn new(
        key: String,
        name: String,
        description: String,
        image_url: Option<String>,
        coordinate: Point,
    ) -> Self {
        Self {
            key,
            name,
            description,
            // Catalog documents often carry empty strings instead of nulls
            image_url: image_url.filter(|url| !url.trim().is_empty()),
            coordinate,
        }
    }
}

impl fmt::Display for Offer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Offer {{ key: {}, name: {}, latitude: {}, longitude: {} }}",
            self.key,
            self.name,
            self.coordinate.y(),
            self.coordinate.x()
        )
    }
}
