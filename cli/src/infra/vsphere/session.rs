//! Infrastructure implementation of the platform port traits for vCenter.
//!
//! `VsphereSession<T>` routes every call through a `SoapTransport`, so tests
//! can drive the inventory walk and attribute writes with canned responses.

use std::collections::HashMap;

use anyhow::{Context, Result};

use super::soap::{self, MoRef, ObjectContent, ServiceContent};
use super::transport::{HttpTransport, SoapTransport};
use crate::application::ports::{
    AttributeWriter, ConnectionParams, InventorySource, PlatformConnector, SessionRelease,
};
use crate::domain::{
    ConnectionError, ContainerNode, Datacenter, EntityHandle, FieldApplyError, Inventory,
};

const FOLDER: &str = "Folder";
const DATACENTER: &str = "Datacenter";
const VIRTUAL_MACHINE: &str = "VirtualMachine";

const CHILD_ENTITY: &[&str] = &["childEntity"];
const NAME: &[&str] = &["name"];
const DATACENTER_PROPS: &[&str] = &["name", "vmFolder"];

/// Opens authenticated vCenter sessions over HTTPS.
pub struct VsphereConnector;

impl PlatformConnector for VsphereConnector {
    type Session = VsphereSession<HttpTransport>;

    async fn connect(&self, params: &ConnectionParams) -> Result<Self::Session, ConnectionError> {
        if !params.verify_tls {
            tracing::warn!(host = %params.host, "TLS certificate verification is disabled");
        }
        let transport = HttpTransport::new(params).map_err(|e| connection_error(params, &e))?;
        VsphereSession::login(transport, params)
            .await
            .map_err(|e| connection_error(params, &e))
    }
}

fn connection_error(params: &ConnectionParams, e: &anyhow::Error) -> ConnectionError {
    ConnectionError {
        host: params.host.clone(),
        cause: format!("{e:#}"),
    }
}

/// A logged-in vCenter session.
pub struct VsphereSession<T: SoapTransport> {
    transport: T,
    content: ServiceContent,
    released: bool,
}

impl<T: SoapTransport> VsphereSession<T> {
    /// Fetch the service content and log in over `transport`.
    ///
    /// # Errors
    ///
    /// Returns an error if either call fails, including bad credentials.
    pub async fn login(transport: T, params: &ConnectionParams) -> Result<Self> {
        let payload = transport
            .call(soap::retrieve_service_content())
            .await
            .context("cannot retrieve service content")?;
        let content = soap::parse_service_content(&payload)?;
        transport
            .call(soap::login(
                &content.session_manager,
                &params.user,
                &params.password,
            ))
            .await
            .context("login failed")?;
        tracing::debug!(host = %params.host, user = %params.user, "logged in");
        Ok(Self {
            transport,
            content,
            released: false,
        })
    }

    /// Retrieve `paths` for `objects`, following continuation tokens.
    async fn retrieve(
        &self,
        prop_sets: &[(&str, &[&str])],
        objects: &[MoRef],
    ) -> Result<Vec<ObjectContent>> {
        if objects.is_empty() {
            return Ok(Vec::new());
        }
        let collector = &self.content.property_collector;
        let payload = self
            .transport
            .call(soap::retrieve_properties(collector, prop_sets, objects))
            .await?;
        let mut page = soap::parse_retrieve_result(&payload);
        let mut all = std::mem::take(&mut page.objects);
        while let Some(token) = page.token.take() {
            let payload = self
                .transport
                .call(soap::continue_retrieve_properties(collector, &token))
                .await?;
            page = soap::parse_retrieve_result(&payload);
            all.append(&mut page.objects);
        }
        Ok(all)
    }

    async fn child_entities(&self, folder: &MoRef) -> Result<Vec<MoRef>> {
        let objects = self
            .retrieve(&[(FOLDER, CHILD_ENTITY)], std::slice::from_ref(folder))
            .await
            .with_context(|| format!("cannot list children of {}", folder.value))?;
        Ok(objects
            .iter()
            .find(|o| o.obj == *folder)
            .map(|o| o.morefs("childEntity"))
            .unwrap_or_default())
    }

    /// Names of folders and machines, keyed by managed-object id.
    async fn names(&self, objects: &[MoRef]) -> Result<HashMap<String, String>> {
        let objects = self
            .retrieve(&[(FOLDER, NAME), (VIRTUAL_MACHINE, NAME)], objects)
            .await
            .context("cannot read object names")?;
        Ok(objects
            .into_iter()
            .filter_map(|o| Some((o.obj.value.clone(), o.text("name")?.to_string())))
            .collect())
    }

    /// Build the subtree under `folder`, keeping children in server order.
    async fn walk_folder(&self, folder: &MoRef, name: String) -> Result<ContainerNode> {
        let children: Vec<MoRef> = self
            .child_entities(folder)
            .await?
            .into_iter()
            .filter(|c| c.kind == FOLDER || c.kind == VIRTUAL_MACHINE)
            .collect();
        let mut names = self.names(&children).await?;

        let mut nodes = Vec::with_capacity(children.len());
        for child in children {
            let child_name = names.remove(&child.value);
            if child.kind == FOLDER {
                let child_name = child_name.unwrap_or_else(|| child.value.clone());
                nodes.push(Box::pin(self.walk_folder(&child, child_name)).await?);
            } else if let Some(vm_name) = child_name {
                nodes.push(ContainerNode::machine(child.value, vm_name));
            } else {
                tracing::debug!(id = %child.value, "skipping machine without a readable name");
            }
        }
        Ok(ContainerNode::folder(name, nodes))
    }
}

impl<T: SoapTransport> InventorySource for VsphereSession<T> {
    async fn inventory(&self) -> Result<Inventory> {
        let root = self.content.root_folder.clone();
        let dc_refs: Vec<MoRef> = self
            .child_entities(&root)
            .await?
            .into_iter()
            .filter(|c| c.kind == DATACENTER)
            .collect();
        let dc_props = self
            .retrieve(&[(DATACENTER, DATACENTER_PROPS)], &dc_refs)
            .await
            .context("cannot read datacenters")?;

        let mut datacenters = Vec::with_capacity(dc_refs.len());
        for dc in &dc_refs {
            let Some(props) = dc_props.iter().find(|o| o.obj == *dc) else {
                continue;
            };
            let name = props.text("name").unwrap_or(&dc.value).to_string();
            let vm_folder = props
                .moref("vmFolder")
                .with_context(|| format!("datacenter {name} has no VM folder"))?;
            let tree = self.walk_folder(&vm_folder, "vm".to_string()).await?;
            tracing::debug!(datacenter = %name, machines = tree.machine_count(), "walked datacenter");
            datacenters.push(Datacenter {
                name,
                vm_folder: tree,
            });
        }
        Ok(Inventory::new(datacenters))
    }
}

impl<T: SoapTransport> AttributeWriter for VsphereSession<T> {
    async fn set_custom_value(
        &self,
        entity: &EntityHandle,
        key: &str,
        value: &str,
    ) -> Result<(), FieldApplyError> {
        let target = MoRef::new(VIRTUAL_MACHINE, entity.id.as_str());
        self.transport
            .call(soap::set_custom_value(&target, key, value))
            .await
            .map(|_| ())
            .map_err(|e| FieldApplyError::new(format!("{e:#}")))
    }
}

impl<T: SoapTransport> SessionRelease for VsphereSession<T> {
    async fn disconnect(mut self) -> Result<()> {
        self.released = true;
        self.transport
            .call(soap::logout(&self.content.session_manager))
            .await
            .map(|_| ())
            .context("logout failed")
    }
}

impl<T: SoapTransport> Drop for VsphereSession<T> {
    fn drop(&mut self) {
        if !self.released {
            tracing::warn!("vCenter session dropped without logout");
        }
    }
}
