//! Background templates and the catalog they are picked from.

use crate::error::CatalogError;
use crate::id::{LayerId, TemplateId};
use crate::layer::{Position, TextLayer};
use crate::layer_set::{LayerSet, MAX_LAYERS};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A background plus the layers it seeds. Immutable once in a catalog:
/// selecting it deep-copies the seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    /// Background source (a path or URL), resolved by the host.
    #[serde(alias = "backgroundImage")]
    pub background: String,
    #[serde(default, alias = "textLayers")]
    pub layers: Vec<TextLayer>,
}

impl Template {
    /// Fresh working set seeded from this template.
    pub fn seed(&self) -> LayerSet {
        LayerSet::create(&self.layers)
    }
}

/// Ordered collection of templates handed to an editing session.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateCatalog {
    templates: Vec<Template>,
}

impl TemplateCatalog {
    /// Build a catalog, rejecting empty catalogs, repeated template IDs and
    /// templates whose seed repeats a layer ID or exceeds [`MAX_LAYERS`].
    pub fn new(templates: Vec<Template>) -> Result<Self, CatalogError> {
        if templates.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut ids = HashSet::new();
        for template in &templates {
            if !ids.insert(template.id.as_str()) {
                return Err(CatalogError::DuplicateTemplate(template.id.to_string()));
            }
            if template.layers.len() > MAX_LAYERS {
                return Err(CatalogError::TooManyLayers {
                    template: template.id.to_string(),
                    count: template.layers.len(),
                    cap: MAX_LAYERS,
                });
            }
            if let Some(layer) = template.seed().first_duplicate_id() {
                return Err(CatalogError::DuplicateLayer {
                    template: template.id.to_string(),
                    layer,
                });
            }
        }
        Ok(Self { templates })
    }

    /// Parse a JSON array of templates.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let templates: Vec<Template> = serde_json::from_str(json)?;
        Self::new(templates)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.templates)
    }

    pub fn get(&self, id: &TemplateId) -> Option<&Template> {
        self.templates.iter().find(|t| &t.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.name == name)
    }

    /// The template a new session starts on.
    pub fn first(&self) -> &Template {
        // `new` rejects empty catalogs.
        &self.templates[0]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Template> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// The stock greeting-card presets.
    pub fn builtin() -> Self {
        const CJK: &str = "PingFang SC, Microsoft YaHei, sans-serif";
        const KAITI: &str = "KaiTi, serif";

        let templates = vec![
            template(
                "1",
                "Spring Festival",
                "https://images.unsplash.com/photo-1578662996442-48f60103fc96?w=300&h=533&fit=crop",
                vec![
                    seed("layer-1", "新春快乐", (150.0, 100.0), 24, CJK, "#ff6b6b", "bold"),
                    seed("layer-2", "恭喜发财", (150.0, 150.0), 18, CJK, "#ffd93d", "normal"),
                    seed("layer-3", "2025年", (150.0, 450.0), 16, CJK, "#ffffff", "normal"),
                ],
            ),
            template(
                "2",
                "Mid-Autumn",
                "https://images.unsplash.com/photo-1506905925346-21bda4d32df4?w=300&h=533&fit=crop",
                vec![
                    seed("layer-1", "中秋快乐", (150.0, 120.0), 26, KAITI, "#ffffff", "bold"),
                    seed("layer-2", "花好月圆", (150.0, 180.0), 20, KAITI, "#f4d03f", "normal"),
                ],
            ),
            template(
                "3",
                "Birthday",
                "https://images.unsplash.com/photo-1513475382585-d06e58bcb0e0?w=300&h=533&fit=crop",
                vec![
                    seed("layer-1", "生日快乐", (150.0, 200.0), 28, CJK, "#ff69b4", "bold"),
                    seed("layer-2", "祝你永远年轻", (150.0, 250.0), 16, CJK, "#ffffff", "normal"),
                    seed("layer-3", "身体健康", (150.0, 280.0), 16, CJK, "#ffffff", "normal"),
                ],
            ),
            template(
                "4",
                "Business Poster",
                "https://images.unsplash.com/photo-1486406146926-c627a92ad1ab?w=300&h=533&fit=crop",
                vec![
                    seed("layer-1", "专业服务", (150.0, 150.0), 24, CJK, "#2c3e50", "bold"),
                    seed("layer-2", "值得信赖", (150.0, 200.0), 18, CJK, "#34495e", "normal"),
                    seed(
                        "layer-3",
                        "联系电话：400-123-4567",
                        (150.0, 400.0),
                        14,
                        "Arial, sans-serif",
                        "#7f8c8d",
                        "normal",
                    ),
                ],
            ),
            template(
                "5",
                "Nature",
                "https://images.unsplash.com/photo-1441974231531-c6227db76b6e?w=300&h=533&fit=crop",
                vec![
                    seed("layer-1", "大自然的美", (150.0, 100.0), 22, KAITI, "#ffffff", "bold"),
                    seed("layer-2", "心灵的净土", (150.0, 140.0), 18, KAITI, "#e8f5e8", "normal"),
                ],
            ),
            template(
                "6",
                "City Lights",
                "https://images.unsplash.com/photo-1449824913935-59a10b8d2000?w=300&h=533&fit=crop",
                vec![
                    seed("layer-1", "繁华都市", (150.0, 120.0), 26, CJK, "#ffffff", "bold"),
                    seed("layer-2", "梦想启航", (150.0, 170.0), 20, CJK, "#f39c12", "normal"),
                    seed("layer-3", "未来可期", (150.0, 220.0), 16, CJK, "#ecf0f1", "normal"),
                ],
            ),
        ];
        Self { templates }
    }
}

impl<'a> IntoIterator for &'a TemplateCatalog {
    type Item = &'a Template;
    type IntoIter = std::slice::Iter<'a, Template>;

    fn into_iter(self) -> Self::IntoIter {
        self.templates.iter()
    }
}

fn template(id: &str, name: &str, background: &str, layers: Vec<TextLayer>) -> Template {
    Template {
        id: TemplateId::new(id),
        name: name.to_string(),
        background: background.to_string(),
        layers,
    }
}

fn seed(
    id: &str,
    text: &str,
    (x, y): (f64, f64),
    font_size: u32,
    font_family: &str,
    color: &str,
    font_weight: &str,
) -> TextLayer {
    TextLayer {
        id: LayerId::intern(id),
        text: text.to_string(),
        position: Position::new(x, y),
        font_size,
        font_family: font_family.to_string(),
        color: color.to_string(),
        font_weight: font_weight.to_string(),
        visible: true,
    }
}
