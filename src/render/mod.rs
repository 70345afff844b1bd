//! Renderer module: Tera templates for builder sources and the index.

pub mod filters;
pub mod view;

use crate::model::FilterRecord;
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};
use view::{FilterView, IndexView};

const BUILDER: &str = "builder";
const INDEX: &str = "index";

const BUILTIN_BUILDER: &str = include_str!("../../templates/builder.rs.tera");
const BUILTIN_INDEX: &str = include_str!("../../templates/index.rs.tera");

/// Output name of the index artifact.
pub const INDEX_NAME: &str = "mod";

/// Template files replacing the built-in ones.
#[derive(Debug, Default, Clone)]
pub struct TemplatePaths {
    pub builder: Option<PathBuf>,
    pub index: Option<PathBuf>,
}

/// A rendered output ready to be handed to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    /// Logical name, without extension
    pub name: String,
    pub content: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to read template {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid template '{template}': {source}")]
    Parse {
        template: &'static str,
        source: tera::Error,
    },
    #[error("render error for '{template}': {source}")]
    Render {
        template: &'static str,
        source: tera::Error,
    },
}

/// Renders filter records through the builder and index templates.
#[derive(Debug)]
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// Load the templates, falling back to the built-in ones.
    pub fn new(paths: &TemplatePaths) -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.register_filter("capitalize_first", filters::capitalize_first);
        tera.register_filter("comment", filters::comment);

        let builder = load(paths.builder.as_deref(), BUILTIN_BUILDER)?;
        tera.add_raw_template(BUILDER, &builder)
            .map_err(|source| RenderError::Parse {
                template: BUILDER,
                source,
            })?;
        let index = load(paths.index.as_deref(), BUILTIN_INDEX)?;
        tera.add_raw_template(INDEX, &index)
            .map_err(|source| RenderError::Parse {
                template: INDEX,
                source,
            })?;

        Ok(Self { tera })
    }

    /// Render one filter's builder source.
    pub fn render_filter(&self, record: &FilterRecord) -> Result<RenderedFile, RenderError> {
        let view = FilterView::new(record);
        let content = self.render(BUILDER, &view)?;
        Ok(RenderedFile {
            name: view.module,
            content,
        })
    }

    /// Render the index over every generated filter.
    pub fn render_index(&self, records: &[FilterRecord]) -> Result<RenderedFile, RenderError> {
        let content = self.render(INDEX, &IndexView::new(records))?;
        Ok(RenderedFile {
            name: INDEX_NAME.to_string(),
            content,
        })
    }

    fn render(&self, template: &'static str, view: &impl serde::Serialize) -> Result<String, RenderError> {
        let render_err = |source| RenderError::Render { template, source };
        let context = Context::from_serialize(view).map_err(render_err)?;
        self.tera.render(template, &context).map_err(render_err)
    }
}

fn load<'a>(path: Option<&Path>, builtin: &'a str) -> Result<Cow<'a, str>, RenderError> {
    match path {
        Some(path) => fs::read_to_string(path)
            .map(Cow::Owned)
            .map_err(|source| RenderError::Read {
                path: path.to_path_buf(),
                source,
            }),
        None => Ok(Cow::Borrowed(builtin)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ParameterRecord;
    use std::io::Write;

    fn builtin() -> Renderer {
        Renderer::new(&TemplatePaths::default()).unwrap()
    }

    fn scale() -> FilterRecord {
        FilterRecord {
            name: "scale".to_string(),
            parameters: vec![
                ParameterRecord {
                    name: "w".to_string(),
                    aliases: vec!["width".to_string()],
                    description: "\nSet the output width.\nDefaults to input.\n".to_string(),
                    allowed_values: Vec::new(),
                },
                ParameterRecord {
                    name: "flags".to_string(),
                    aliases: Vec::new(),
                    description: "Scaler flags.".to_string(),
                    allowed_values: vec![ParameterRecord {
                        name: "bicubic".to_string(),
                        description: "Bicubic scaling.".to_string(),
                        ..ParameterRecord::default()
                    }],
                },
            ],
        }
    }

    #[test]
    fn builder_has_setters_in_order() {
        let file = builtin().render_filter(&scale()).unwrap();
        assert_eq!(file.name, "scale");
        let content = &file.content;
        assert!(content.contains("pub struct ScaleFilter {"));
        assert!(content.contains("const NAME: &'static str = \"scale\";"));
        let w = content.find("pub fn w(mut self").unwrap();
        let flags = content.find("pub fn flags(mut self").unwrap();
        assert!(w < flags);
        assert!(content.contains("options.push((\"w\", value.clone()));"));
    }

    #[test]
    fn builder_comments_continue_lines() {
        let file = builtin().render_filter(&scale()).unwrap();
        assert!(file
            .content
            .contains("    /// Set the output width.\n    /// Defaults to input.\n"));
        assert!(file.content.contains("    /// - `bicubic`: Bicubic scaling.\n"));
        assert!(file.content.contains("    /// Also documented as `width`.\n"));
    }

    #[test]
    fn builder_from_crlf_markup_has_no_carriage_returns() {
        let markup = "<h3>Filter f</h3>\r\n<dl>\r\n<dt>x</dt>\r\n\
                      <dd>Line one.\r\nLine two.\r\n\
                      <dl>\r\n<dt>1</dt>\r\n<dd>One.\r\nStill one.\r\n</dd>\r\n</dl>\r\n</dd>\r\n</dl>\r\n";
        let records = crate::extract::extract(markup, &Default::default()).unwrap();
        let file = builtin().render_filter(&records[0]).unwrap();
        assert!(!file.content.contains('\r'));
        assert!(file.content.contains("    /// Line one.\n    /// Line two.\n"));
        assert!(file.content.contains("    /// - `1`: One.\n    /// Still one.\n"));
    }

    #[test]
    fn builder_without_parameters() {
        let record = FilterRecord {
            name: "null".to_string(),
            parameters: Vec::new(),
        };
        let file = builtin().render_filter(&record).unwrap();
        assert!(file.content.contains("pub struct NullFilter {\n}"));
        assert!(file.content.contains("pub fn new() -> Self"));
        assert!(file.content.contains("fn options(&self)"));
    }

    #[test]
    fn index_lists_modules() {
        let records = vec![scale(), FilterRecord {
            name: "loop".to_string(),
            parameters: Vec::new(),
        }];
        let file = builtin().render_index(&records).unwrap();
        assert_eq!(file.name, INDEX_NAME);
        assert!(file.content.contains("pub mod scale;\npub mod loop_;"));
        assert!(file.content.contains("pub use loop_::LoopFilter;"));
        assert!(file.content.contains("pub trait Filter"));
    }

    #[test]
    fn unnameable_filter_does_not_shadow_trait() {
        let records = vec![FilterRecord {
            name: "_".to_string(),
            parameters: Vec::new(),
        }];
        let index = builtin().render_index(&records).unwrap();
        assert!(index.content.contains("pub use value::ValueFilter;"));
        assert!(!index.content.contains("::Filter;"));
        let file = builtin().render_filter(&records[0]).unwrap();
        assert!(file.content.contains("pub struct ValueFilter {"));
    }

    #[test]
    fn empty_index_renders() {
        let file = builtin().render_index(&[]).unwrap();
        assert!(file.content.contains("0 filters"));
        assert!(!file.content.contains("pub mod"));
    }

    #[test]
    fn custom_templates_override_builtins() {
        let mut builder = tempfile::NamedTempFile::new().unwrap();
        builder
            .write_all(b"{{ name | capitalize_first }}:{% for p in parameters %} {{ p.name }}{% endfor %}")
            .unwrap();
        let paths = TemplatePaths {
            builder: Some(builder.path().to_path_buf()),
            index: None,
        };
        let renderer = Renderer::new(&paths).unwrap();
        let file = renderer.render_filter(&scale()).unwrap();
        assert_eq!(file.content, "Scale: w flags");
    }

    #[test]
    fn missing_template_file() {
        let paths = TemplatePaths {
            builder: Some(PathBuf::from("/nonexistent/builder.tera")),
            index: None,
        };
        let err = Renderer::new(&paths).unwrap_err();
        assert!(matches!(err, RenderError::Read { .. }));
    }

    #[test]
    fn invalid_template_syntax() {
        let mut index = tempfile::NamedTempFile::new().unwrap();
        index.write_all(b"{% for f in filters %}").unwrap();
        let paths = TemplatePaths {
            builder: None,
            index: Some(index.path().to_path_buf()),
        };
        let err = Renderer::new(&paths).unwrap_err();
        assert!(matches!(err, RenderError::Parse { template: "index", .. }));
    }
}
