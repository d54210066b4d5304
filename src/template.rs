//! Region templates for batch scanning.
//!
//! A template captures named field regions once, against a reference
//! resolution, so the same layout can be applied to every page of a batch
//! regardless of each page's actual pixel dimensions.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Rect;
use crate::recognize::FieldRegion;

/// Errors reading or writing templates.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Template serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One named field and its region in reference coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateField {
    pub name: String,
    pub region: Rect,
}

/// Named field regions defined against a reference page resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionTemplate {
    /// Resolution the field regions were drawn against.
    pub reference_width: u32,
    pub reference_height: u32,
    pub fields: Vec<TemplateField>,
}

impl RegionTemplate {
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), TemplateError> {
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Starter template for a typical invoice layout.
    pub fn starter() -> Self {
        Self {
            reference_width: 1600,
            reference_height: 1200,
            fields: vec![
                TemplateField {
                    name: "Invoice number".to_string(),
                    region: Rect {
                        x1: 1100.0,
                        y1: 60.0,
                        x2: 1540.0,
                        y2: 130.0,
                    },
                },
                TemplateField {
                    name: "Date".to_string(),
                    region: Rect {
                        x1: 1100.0,
                        y1: 140.0,
                        x2: 1540.0,
                        y2: 210.0,
                    },
                },
                TemplateField {
                    name: "Total".to_string(),
                    region: Rect {
                        x1: 1100.0,
                        y1: 1000.0,
                        x2: 1540.0,
                        y2: 1100.0,
                    },
                },
            ],
        }
    }

    /// Scale the fields into the coordinate space of a `width x height`
    /// page, clamped the same way editor regions are for cropping.
    pub fn resolve(&self, width: u32, height: u32) -> Vec<FieldRegion> {
        if self.reference_width == 0 || self.reference_height == 0 || width == 0 || height == 0 {
            return Vec::new();
        }
        let sx = width as f32 / self.reference_width as f32;
        let sy = height as f32 / self.reference_height as f32;
        self.fields
            .iter()
            .map(|f| FieldRegion {
                name: f.name.clone(),
                rect: f
                    .region
                    .scaled(sx, sy)
                    .clamp_for_crop(width as f32, height as f32),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_roundtrip() {
        let template = RegionTemplate::starter();
        let text = toml::to_string_pretty(&template).unwrap();
        let parsed: RegionTemplate = toml::from_str(&text).unwrap();
        assert_eq!(parsed.reference_width, 1600);
        assert_eq!(parsed.fields.len(), 3);
        assert_eq!(parsed.fields[0].name, "Invoice number");
    }

    #[test]
    fn test_resolve_scales_to_page() {
        let template = RegionTemplate {
            reference_width: 100,
            reference_height: 100,
            fields: vec![TemplateField {
                name: "Field".to_string(),
                region: Rect {
                    x1: 10.0,
                    y1: 20.0,
                    x2: 50.0,
                    y2: 40.0,
                },
            }],
        };
        let fields = template.resolve(200, 400);
        assert_eq!(fields.len(), 1);
        let r = fields[0].rect;
        assert_eq!(r.x1, 20.0);
        assert_eq!(r.y1, 80.0);
        assert_eq!(r.x2, 100.0);
        assert_eq!(r.y2, 160.0);
    }

    #[test]
    fn test_resolve_clamps_oversized_fields() {
        let template = RegionTemplate {
            reference_width: 100,
            reference_height: 100,
            fields: vec![TemplateField {
                name: "Edge".to_string(),
                region: Rect {
                    x1: 90.0,
                    y1: 90.0,
                    x2: 150.0,
                    y2: 150.0,
                },
            }],
        };
        let r = template.resolve(100, 100)[0].rect;
        assert!(r.x2 <= 100.0);
        assert!(r.y2 <= 100.0);
    }
}
