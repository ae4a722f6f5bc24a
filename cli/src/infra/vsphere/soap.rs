//! vSphere Web Services (vim25) request bodies and response decoding.
//!
//! Only the handful of methods attrsync needs are covered: service content,
//! login/logout, property retrieval with continuation, and `setCustomValue`.

use std::borrow::Cow;

use anyhow::{Context, Result};
use quick_xml::escape::escape;

use super::xml::Element;

/// `SOAPAction` header value sent with every call.
pub const SOAP_ACTION: &str = "urn:vim25/7.0.3.0";

/// A managed object reference: type name plus server-side id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MoRef {
    pub kind: String,
    pub value: String,
}

impl MoRef {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }

    fn from_element(el: &Element) -> Option<Self> {
        let kind = el.attr("type")?;
        Some(Self::new(kind, el.text.trim()))
    }

    fn to_xml(&self, tag: &str) -> String {
        format!(
            r#"<{tag} type="{}">{}</{tag}>"#,
            escape(&self.kind),
            escape(&self.value)
        )
    }
}

/// The service-content references needed after connecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceContent {
    pub root_folder: MoRef,
    pub property_collector: MoRef,
    pub session_manager: MoRef,
}

/// One object from a property retrieval and the properties returned for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectContent {
    pub obj: MoRef,
    pub props: Vec<(String, Element)>,
}

impl ObjectContent {
    fn val(&self, name: &str) -> Option<&Element> {
        self.props.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// A string-valued property.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.val(name).map(|v| v.text.as_str())
    }

    /// A `ManagedObjectReference`-valued property.
    #[must_use]
    pub fn moref(&self, name: &str) -> Option<MoRef> {
        self.val(name).and_then(MoRef::from_element)
    }

    /// An `ArrayOfManagedObjectReference`-valued property, in server order.
    #[must_use]
    pub fn morefs(&self, name: &str) -> Vec<MoRef> {
        self.val(name)
            .map(|v| {
                v.children_named("ManagedObjectReference")
                    .filter_map(MoRef::from_element)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// One page of a property retrieval.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrieveResult {
    pub objects: Vec<ObjectContent>,
    pub token: Option<String>,
}

// ── Requests ──────────────────────────────────────────────────────────────────

/// Wrap a method body in a SOAP 1.1 envelope.
#[must_use]
pub fn envelope(body: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" "#,
            r#"xmlns:xsd="http://www.w3.org/2001/XMLSchema" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            "<soapenv:Body>{}</soapenv:Body></soapenv:Envelope>"
        ),
        body
    )
}

#[must_use]
pub fn retrieve_service_content() -> String {
    r#"<RetrieveServiceContent xmlns="urn:vim25"><_this type="ServiceInstance">ServiceInstance</_this></RetrieveServiceContent>"#.to_string()
}

#[must_use]
pub fn login(session_manager: &MoRef, user: &str, password: &str) -> String {
    format!(
        r#"<Login xmlns="urn:vim25">{}<userName>{}</userName><password>{}</password></Login>"#,
        session_manager.to_xml("_this"),
        escape(user),
        escape(password)
    )
}

#[must_use]
pub fn logout(session_manager: &MoRef) -> String {
    format!(
        r#"<Logout xmlns="urn:vim25">{}</Logout>"#,
        session_manager.to_xml("_this")
    )
}

/// `RetrievePropertiesEx` for `objects`, asking for `paths` on each listed type.
#[must_use]
pub fn retrieve_properties(
    collector: &MoRef,
    prop_sets: &[(&str, &[&str])],
    objects: &[MoRef],
) -> String {
    let mut body = format!(r#"<RetrievePropertiesEx xmlns="urn:vim25">{}<specSet>"#, collector.to_xml("_this"));
    for (kind, paths) in prop_sets {
        body.push_str("<propSet><type>");
        body.push_str(&escape(*kind));
        body.push_str("</type>");
        for path in *paths {
            body.push_str("<pathSet>");
            body.push_str(&escape(*path));
            body.push_str("</pathSet>");
        }
        body.push_str("</propSet>");
    }
    for obj in objects {
        body.push_str("<objectSet>");
        body.push_str(&obj.to_xml("obj"));
        body.push_str("</objectSet>");
    }
    body.push_str("</specSet><options/></RetrievePropertiesEx>");
    body
}

#[must_use]
pub fn continue_retrieve_properties(collector: &MoRef, token: &str) -> String {
    format!(
        r#"<ContinueRetrievePropertiesEx xmlns="urn:vim25">{}<token>{}</token></ContinueRetrievePropertiesEx>"#,
        collector.to_xml("_this"),
        escape(token)
    )
}

#[must_use]
pub fn set_custom_value(entity: &MoRef, key: &str, value: &str) -> String {
    format!(
        r#"<setCustomValue xmlns="urn:vim25">{}<key>{}</key><value>{}</value></setCustomValue>"#,
        entity.to_xml("_this"),
        escape(key),
        escape(value)
    )
}

// ── Responses ─────────────────────────────────────────────────────────────────

/// The `faultstring` of a SOAP fault, if the envelope carries one.
#[must_use]
pub fn fault_string(envelope: &Element) -> Option<String> {
    let fault = envelope.find("Fault")?;
    let message = fault
        .child("faultstring")
        .map(|f| f.text.trim())
        .filter(|s| !s.is_empty())
        .map(Cow::Borrowed)
        .unwrap_or_else(|| {
            // Some faults only name their type in <detail>.
            fault
                .child("detail")
                .and_then(|d| d.children.first())
                .map_or(Cow::Borrowed("unknown SOAP fault"), |d| {
                    Cow::Owned(d.name.clone())
                })
        });
    Some(message.into_owned())
}

/// The method response element inside `<Body>`.
///
/// # Errors
///
/// Returns an error if the envelope has no body.
pub fn body_payload(envelope: Element) -> Result<Element> {
    let body = envelope
        .children
        .into_iter()
        .find(|c| c.name == "Body")
        .context("SOAP envelope has no Body")?;
    Ok(body.children.into_iter().next().unwrap_or_default())
}

/// Decode a `RetrieveServiceContentResponse`.
///
/// # Errors
///
/// Returns an error if a required reference is missing.
pub fn parse_service_content(payload: &Element) -> Result<ServiceContent> {
    let rv = payload
        .child("returnval")
        .context("service content response has no returnval")?;
    let get = |name: &str| {
        rv.child(name)
            .and_then(MoRef::from_element)
            .with_context(|| format!("service content has no {name}"))
    };
    Ok(ServiceContent {
        root_folder: get("rootFolder")?,
        property_collector: get("propertyCollector")?,
        session_manager: get("sessionManager")?,
    })
}

/// Decode a `RetrievePropertiesExResponse` or
/// `ContinueRetrievePropertiesExResponse`. An empty response yields no objects.
#[must_use]
pub fn parse_retrieve_result(payload: &Element) -> RetrieveResult {
    let Some(rv) = payload.child("returnval") else {
        return RetrieveResult::default();
    };
    let objects = rv
        .children_named("objects")
        .filter_map(|o| {
            let obj = o.child("obj").and_then(MoRef::from_element)?;
            let props = o
                .children_named("propSet")
                .filter_map(|p| {
                    let name = p.child("name")?.text.clone();
                    let val = p.child("val")?.clone();
                    Some((name, val))
                })
                .collect();
            Some(ObjectContent { obj, props })
        })
        .collect();
    let token = rv
        .child("token")
        .map(|t| t.text.trim().to_string())
        .filter(|t| !t.is_empty());
    RetrieveResult { objects, token }
}
