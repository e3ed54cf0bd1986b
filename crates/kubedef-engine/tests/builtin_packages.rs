//! End-to-end evaluation of manifests against the built-in packages

use kubedef_core::{Gvk, Registry};
use kubedef_engine::{
    from_structured_map, to_structured_map, ConvertError, Engine, EvaluatedResult,
    EvaluationContext, Unstructured,
};
use serde_json::json;

fn evaluate(manifest: &str) -> EvaluatedResult {
    let registry = Registry::with_builtin_catalogue().expect("catalogue loads");
    let ctx = EvaluationContext::bound(&registry);
    Engine::default()
        .evaluate_str(&ctx, manifest)
        .expect("manifest evaluates")
}

fn structured(manifest: &str) -> serde_json::Value {
    let object = to_structured_map(&evaluate(manifest)).expect("result is concrete");
    object.into()
}

#[test]
fn test_service_in_kube_package() {
    let output = structured(
        r#"
imports:
  v1: k8s.io/core/v1
  kube: kube/v1
output: v1.#Service & kube.#Service
parameter:
  name: myapp
template: |
  metadata:
    name: {{ parameter.name }}
  spec:
    type: ClusterIP
"#,
    );

    assert_eq!(
        output,
        json!({
            "kind": "Service",
            "apiVersion": "v1",
            "metadata": {"name": "myapp"},
            "spec": {"type": "ClusterIP"}
        })
    );

    let registry = Registry::with_builtin_catalogue().unwrap();
    assert!(registry.exist(&Gvk::new("", "v1", "Service")));
}

#[test]
fn test_invalid_import_path_is_undefined_field() {
    let result = evaluate(
        r#"
imports:
  v1: k8s.io/networking/v1
  kube: kube/networking.k8s.io/v1
output: v1.#Deployment & kube.#Deployment
parameter:
  name: myapp
  image: nginx
template: |
  metadata:
    name: {{ parameter.name }}
  spec:
    template:
      spec:
        containers:
          - name: invalid-path
            image: {{ parameter.image }}
"#,
    );

    let err = to_structured_map(&result).unwrap_err();
    assert!(matches!(err, ConvertError::Undefined(_)));
    assert_eq!(err.to_string(), "undefined field \"#Deployment\"");
}

#[test]
fn test_ingress_with_loop_over_parameters() {
    let output = structured(
        r#"
imports:
  network: k8s.io/networking/v1beta1
  kube: kube/networking.k8s.io/v1beta1
output: network.#Ingress & kube.#Ingress
parameter:
  domain: abc.com
  http:
    "/": 80
template: |
  apiVersion: networking.k8s.io/v1beta1
  kind: Ingress
  metadata:
    name: myapp
  spec:
    rules:
      - host: {{ parameter.domain }}
        http:
          paths:
  {%- for path, port in parameter.http|items %}
            - path: {{ path }}
              backend:
                serviceName: myname
                servicePort: {{ port }}
  {%- endfor %}
"#,
    );

    assert_eq!(
        output,
        json!({
            "kind": "Ingress",
            "apiVersion": "networking.k8s.io/v1beta1",
            "metadata": {"name": "myapp"},
            "spec": {
                "rules": [{
                    "host": "abc.com",
                    "http": {
                        "paths": [{
                            "path": "/",
                            "backend": {"serviceName": "myname", "servicePort": 80}
                        }]
                    }
                }]
            }
        })
    );
    assert!(output["spec"]["rules"][0]["http"]["paths"][0]["backend"]["servicePort"].is_i64());
}

#[test]
fn test_deployment_fills_required_selector() {
    let output = structured(
        r#"
imports:
  apps: k8s.io/apps/v1
  kube: kube/apps/v1
output: apps.#Deployment & kube.#Deployment
parameter:
  name: myapp
  image: nginx
template: |
  metadata:
    name: {{ parameter.name }}
  spec:
    template:
      spec:
        containers:
          - name: test
            image: {{ parameter.image }}
"#,
    );

    assert_eq!(
        output,
        json!({
            "kind": "Deployment",
            "apiVersion": "apps/v1",
            "metadata": {"name": "myapp"},
            "spec": {
                "selector": {},
                "template": {
                    "spec": {
                        "containers": [{"name": "test", "image": "nginx"}]
                    }
                }
            }
        })
    );
}

#[test]
fn test_secret_type_at_top_level() {
    let output = structured(
        r#"
imports:
  v1: k8s.io/core/v1
  kube: kube/v1
output: v1.#Secret & kube.#Secret
parameter:
  name: myapp
template: |
  metadata:
    name: {{ parameter.name }}
  type: kubevela
"#,
    );

    assert_eq!(
        output,
        json!({
            "kind": "Secret",
            "apiVersion": "v1",
            "metadata": {"name": "myapp"},
            "type": "kubevela"
        })
    );
}

#[test]
fn test_service_port_round_trips_as_integer() {
    let output = structured(
        r#"
imports:
  v1: k8s.io/core/v1
output: v1.#Service
value:
  metadata:
    name: web
  spec:
    ports:
      - port: 80
        targetPort: http
"#,
    );

    assert!(output["spec"]["ports"][0]["port"].is_i64());
    assert_eq!(output["spec"]["ports"][0]["port"], json!(80));

    let object: Unstructured = serde_json::from_value(output.clone()).unwrap();
    let back = to_structured_map(&EvaluatedResult::new(from_structured_map(&object))).unwrap();
    assert_eq!(serde_json::Value::from(back), output);
}

#[test]
fn test_missing_required_port_is_incomplete() {
    let result = evaluate(
        r#"
imports:
  v1: k8s.io/core/v1
output: v1.#Service
value:
  spec:
    ports:
      - name: http
"#,
    );

    let err = to_structured_map(&result).unwrap_err();
    assert_eq!(
        err,
        ConvertError::IncompleteValue("output.spec.ports.0.port: incomplete value int".to_string())
    );
}

#[test]
fn test_unknown_field_on_closed_definition() {
    let result = evaluate(
        r#"
imports:
  v1: k8s.io/core/v1
output: v1.#ConfigMap
value:
  data:
    key: value
  dta:
    key: value
"#,
    );

    let err = to_structured_map(&result).unwrap_err();
    assert_eq!(err, ConvertError::Conflict("output.dta: field not allowed".to_string()));
}
