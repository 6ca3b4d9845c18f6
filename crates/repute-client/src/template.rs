//! URI template handling.

use iri_string::spec::UriSpec;
use iri_string::template::simple_context::{SimpleContext, Value};
use iri_string::template::UriTemplateStr;
use repute_core::{ReputeError, Result};
use url::Url;

/// Check that `template` is a syntactically valid URI template.
pub(crate) fn validate(template: &str) -> Result<()> {
    UriTemplateStr::new(template)
        .map(|_| ())
        .map_err(|e| ReputeError::Template(format!("{template:?}: {e}")))
}

/// Expand `template` with `params` and parse the result as an absolute URL.
pub(crate) fn expand(template: &str, params: &[(&str, &str)]) -> Result<Url> {
    let parsed = UriTemplateStr::new(template)
        .map_err(|e| ReputeError::Template(format!("{template:?}: {e}")))?;

    let mut context = SimpleContext::new();
    for &(key, value) in params {
        context.insert(key, Value::String(value.to_owned()));
    }

    let expanded = parsed
        .expand::<UriSpec, _>(&context)
        .map_err(|e| ReputeError::Template(format!("{template:?}: {e}")))?
        .to_string();

    Url::parse(&expanded).map_err(|e| ReputeError::InvalidUrl(format!("{expanded}: {e}")))
}

/// Turn a discovery response body into a query template.
///
/// One trailing newline is dropped. The rest must be a non-empty, valid
/// template, otherwise nothing is cached and the next query retries
/// discovery.
pub(crate) fn from_discovery_body(body: &[u8]) -> Result<String> {
    let body = body.strip_suffix(b"\n").unwrap_or(body);
    let template = std::str::from_utf8(body)
        .map_err(|e| ReputeError::Template(format!("discovered template is not UTF-8: {e}")))?;
    if template.is_empty() {
        return Err(ReputeError::Template(
            "discovery returned an empty template".into(),
        ));
    }
    validate(template)?;
    Ok(template.to_owned())
}
