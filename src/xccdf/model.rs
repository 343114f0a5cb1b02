//! Scoring models (`model` / `param`)

use std::io::Write;

use roxmltree::Node;
use serde::{Deserialize, Serialize};

use super::decode::{self, DecodeNode, Scope};
use super::encode::{Attrs, EncodeNode, XmlWriter};
use crate::error::Result;

/// Default scoring model URI
pub const DEFAULT_MODEL: &str = "urn:xccdf:scoring:default";

/// Named parameter of a scoring model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub value: String,
}

impl DecodeNode for Param {
    fn decode_node(node: Node<'_, '_>, _scope: &Scope<'_>, path: &str) -> Result<Self> {
        Ok(Self {
            name: decode::required_attr(node, "name", path)?,
            value: decode::opaque_text(node),
        })
    }
}

impl EncodeNode for Param {
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        w.text_element("param", &Attrs::new().with("name", &self.name), &self.value)
    }
}

/// Scoring model suggested by the benchmark
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub system: String,
    pub params: Vec<Param>,
}

impl DecodeNode for Model {
    fn decode_node(node: Node<'_, '_>, scope: &Scope<'_>, path: &str) -> Result<Self> {
        Ok(Self {
            system: decode::required_attr(node, "system", path)?,
            params: decode::decode_all(node, scope, path, "param")?,
        })
    }
}

impl EncodeNode for Model {
    fn encode_node<W: Write>(&self, w: &mut XmlWriter<W>) -> Result<()> {
        let attrs = Attrs::new().with("system", &self.system);
        if self.params.is_empty() {
            return w.empty("model", &attrs);
        }
        w.start("model", &attrs)?;
        w.all(&self.params)?;
        w.end("model")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecodeProfile;
    use crate::xccdf::encode::to_document;

    #[test]
    fn test_model_params() {
        let xml = r#"<model system="urn:xccdf:scoring:flat-unweighted">
            <param name="cutoff">0.8</param>
        </model>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let root = doc.root_element();
        let scope = Scope::for_root(root, DecodeProfile::Full);
        let model = Model::decode_node(root, &scope, "Benchmark/model").unwrap();
        assert_eq!(model.system, "urn:xccdf:scoring:flat-unweighted");
        assert_eq!(model.params, vec![Param { name: "cutoff".to_string(), value: "0.8".to_string() }]);
    }

    #[test]
    fn test_model_requires_system() {
        let doc = roxmltree::Document::parse("<model/>").unwrap();
        let root = doc.root_element();
        let scope = Scope::for_root(root, DecodeProfile::Full);
        let err = Model::decode_node(root, &scope, "Benchmark/model").unwrap_err();
        assert_eq!(err.path(), Some("Benchmark/model"));
    }

    #[test]
    fn test_default_model_encodes_empty() {
        let model = Model { system: DEFAULT_MODEL.to_string(), params: Vec::new() };
        let out = String::from_utf8(to_document(&model).unwrap()).unwrap();
        assert!(out.ends_with("<model system=\"urn:xccdf:scoring:default\"/>\n"));
    }
}
