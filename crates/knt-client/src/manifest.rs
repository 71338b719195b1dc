//! Agent manifest
//!
//! A multi-document YAML file holding the agent Deployment, the Service in
//! front of it and an optional Ingress. Documents are recognised by their
//! `kind`, so their order in the file does not matter. The fields the run
//! depends on are checked once at load time.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use knt_core::{LabelSelector, Resource, ResourceKind};

use crate::error::ManifestError;

/// Parsed agent manifest
#[derive(Debug, Clone)]
pub struct Manifest {
    deployment: Resource,
    service: Resource,
    ingress: Option<Resource>,
    selector: LabelSelector,
    service_port: u16,
}

impl Manifest {
    /// Read and parse a manifest file
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest = Self::parse(&text)?;
        tracing::debug!("Loaded manifest from {:?}", path);
        Ok(manifest)
    }

    /// Parse manifest text
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let mut deployment = None;
        let mut service = None;
        let mut ingress = None;

        for document in serde_yaml::Deserializer::from_str(text) {
            let value = Value::deserialize(document)?;
            if value.is_null() {
                continue;
            }

            let kind = document_kind(&value)?;
            let slot = match kind {
                ResourceKind::Deployment => &mut deployment,
                ResourceKind::Service => &mut service,
                ResourceKind::Ingress => &mut ingress,
            };
            if slot.is_some() {
                return Err(ManifestError::DuplicateDocument(kind));
            }

            let name = metadata_name(kind, &value)?;
            *slot = Some(Resource {
                kind,
                name,
                document: value,
            });
        }

        let deployment =
            deployment.ok_or(ManifestError::MissingDocument(ResourceKind::Deployment))?;
        let service = service.ok_or(ManifestError::MissingDocument(ResourceKind::Service))?;
        let selector = pod_selector(&deployment.document)?;
        let service_port = last_service_port(&service.document)?;

        Ok(Self {
            deployment,
            service,
            ingress,
            selector,
            service_port,
        })
    }

    /// Override the Deployment's replica count
    pub fn set_replicas(&mut self, replicas: u32) {
        // spec is known to be an object once parsing succeeded
        if let Some(spec) = self
            .deployment
            .document
            .get_mut("spec")
            .and_then(Value::as_object_mut)
        {
            spec.insert("replicas".to_string(), Value::from(replicas));
        }
    }

    /// The agent Deployment
    pub fn deployment(&self) -> &Resource {
        &self.deployment
    }

    /// The Service fronting the agents
    pub fn service(&self) -> &Resource {
        &self.service
    }

    /// The Ingress exposing the agents, if the manifest has one
    pub fn ingress(&self) -> Option<&Resource> {
        self.ingress.as_ref()
    }

    /// Selector matching the agent pods (`spec.selector.matchLabels`)
    pub fn pod_selector(&self) -> &LabelSelector {
        &self.selector
    }

    /// Last port listed on the Service
    pub fn service_port(&self) -> u16 {
        self.service_port
    }

    /// Resources in creation order: Deployment, Service, then Ingress
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        [Some(&self.deployment), Some(&self.service), self.ingress.as_ref()]
            .into_iter()
            .flatten()
    }
}

fn document_kind(value: &Value) -> Result<ResourceKind, ManifestError> {
    match value.get("kind").and_then(Value::as_str) {
        Some("Deployment") => Ok(ResourceKind::Deployment),
        Some("Service") => Ok(ResourceKind::Service),
        Some("Ingress") => Ok(ResourceKind::Ingress),
        Some(other) => Err(ManifestError::UnsupportedKind(other.to_string())),
        None => Err(ManifestError::UnsupportedKind("<none>".to_string())),
    }
}

fn metadata_name(kind: ResourceKind, value: &Value) -> Result<String, ManifestError> {
    value
        .pointer("/metadata/name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or(ManifestError::MissingField {
            kind,
            field: "metadata.name",
        })
}

fn pod_selector(deployment: &Value) -> Result<LabelSelector, ManifestError> {
    let missing = ManifestError::MissingField {
        kind: ResourceKind::Deployment,
        field: "spec.selector.matchLabels",
    };

    let labels = match deployment
        .pointer("/spec/selector/matchLabels")
        .and_then(Value::as_object)
    {
        Some(labels) if !labels.is_empty() => labels,
        _ => return Err(missing),
    };

    let mut selector = LabelSelector::default();
    for (key, value) in labels {
        match value.as_str() {
            Some(value) => {
                selector.0.insert(key.clone(), value.to_string());
            }
            None => return Err(missing),
        }
    }
    Ok(selector)
}

fn last_service_port(service: &Value) -> Result<u16, ManifestError> {
    service
        .pointer("/spec/ports")
        .and_then(Value::as_array)
        .and_then(|ports| ports.last())
        .and_then(|port| port.get("port"))
        .and_then(Value::as_u64)
        .and_then(|port| u16::try_from(port).ok())
        .filter(|port| *port != 0)
        .ok_or(ManifestError::MissingField {
            kind: ResourceKind::Service,
            field: "spec.ports[].port",
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: pinger
  labels:
    app: pinger
spec:
  replicas: 1
  selector:
    matchLabels:
      app: pinger
  template:
    metadata:
      labels:
        app: pinger
    spec:
      containers:
        - name: pinger
          image: pinger:latest
---
apiVersion: v1
kind: Service
metadata:
  name: pinger-svc
spec:
  selector:
    app: pinger
  ports:
    - name: metrics
      port: 9090
    - name: http
      port: 8080
---
apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: pinger-ingress
spec:
  rules:
    - http:
        paths:
          - path: /
            pathType: Prefix
            backend:
              service:
                name: pinger-svc
                port:
                  number: 8080
"#;

    #[test]
    fn test_parse_full_manifest() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        assert_eq!(manifest.deployment().name, "pinger");
        assert_eq!(manifest.service().name, "pinger-svc");
        assert_eq!(manifest.ingress().unwrap().name, "pinger-ingress");
        assert_eq!(manifest.pod_selector().to_string(), "app=pinger");
        assert_eq!(manifest.service_port(), 8080);

        let kinds: Vec<_> = manifest.resources().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            [
                ResourceKind::Deployment,
                ResourceKind::Service,
                ResourceKind::Ingress
            ]
        );
    }

    #[test]
    fn test_ingress_is_optional() {
        let without_ingress = MANIFEST.split("---").take(2).collect::<Vec<_>>().join("---");
        let manifest = Manifest::parse(&without_ingress).unwrap();
        assert!(manifest.ingress().is_none());
        assert_eq!(manifest.resources().count(), 2);
    }

    #[test]
    fn test_document_order_does_not_matter() {
        let docs: Vec<&str> = MANIFEST.split("---").collect();
        let reordered = [docs[2], docs[0], docs[1]].join("---");
        let manifest = Manifest::parse(&reordered).unwrap();
        assert_eq!(manifest.deployment().name, "pinger");
        assert_eq!(manifest.ingress().unwrap().name, "pinger-ingress");
    }

    #[test]
    fn test_set_replicas() {
        let mut manifest = Manifest::parse(MANIFEST).unwrap();
        manifest.set_replicas(5);
        assert_eq!(
            manifest.deployment().document.pointer("/spec/replicas"),
            Some(&Value::from(5))
        );
    }

    #[test]
    fn test_missing_service() {
        let only_deployment = MANIFEST.split("---").next().unwrap();
        let err = Manifest::parse(only_deployment).unwrap_err();
        assert!(matches!(
            err,
            ManifestError::MissingDocument(ResourceKind::Service)
        ));
    }

    #[test]
    fn test_duplicate_document() {
        let doubled = format!("{}---{}", MANIFEST, MANIFEST.split("---").next().unwrap());
        let err = Manifest::parse(&doubled).unwrap_err();
        assert!(matches!(
            err,
            ManifestError::DuplicateDocument(ResourceKind::Deployment)
        ));
    }

    #[test]
    fn test_unsupported_kind() {
        let text = format!("{}---\nkind: ConfigMap\nmetadata:\n  name: x\n", MANIFEST);
        let err = Manifest::parse(&text).unwrap_err();
        assert!(matches!(err, ManifestError::UnsupportedKind(kind) if kind == "ConfigMap"));
    }

    #[test]
    fn test_missing_selector() {
        let text = MANIFEST.replace("matchLabels:\n      app: pinger", "matchLabels: {}");
        let err = Manifest::parse(&text).unwrap_err();
        assert!(matches!(
            err,
            ManifestError::MissingField {
                kind: ResourceKind::Deployment,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_service_port() {
        let text = MANIFEST.replace("port: 8080\n---", "targetPort: 8080\n---");
        let err = Manifest::parse(&text).unwrap_err();
        assert!(matches!(
            err,
            ManifestError::MissingField {
                kind: ResourceKind::Service,
                field: "spec.ports[].port"
            }
        ));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = Manifest::parse("kind: [Deployment").unwrap_err();
        assert!(matches!(err, ManifestError::Yaml(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Manifest::load(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ManifestError::Read { .. }));
    }
}
