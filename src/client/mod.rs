//! TM1 REST Client
//!
//! `Tm1Client` is the explicitly owned connection handle to one server. It is
//! cheap to share behind an `Arc` and safe for concurrent use; the underlying
//! `reqwest::Client` pools connections.

mod odata;

use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::backend::{CellWriter, CubeSchemaResolver, DimensionMembershipOracle, MetadataService, ProcedureStore};
use crate::config::Tm1Config;
use crate::error::{Result, Tm1Error};
use crate::model::{BulkWriteRequest, CellSet, CellValue, Chore, CoordinateTuple, Cube, Dimension, Element, ElementType, Procedure};

use odata::{entity, Collection, Named};

const PROCEDURE_SELECT: &str = "$select=Name,PrologProcedure,MetadataProcedure,DataProcedure,EpilogProcedure";
const CHORE_SELECT: &str = "$select=Name,Active,StartTime,Frequency";

pub struct Tm1Client {
    http: Client,
    config: Tm1Config,
}

impl Tm1Client {
    /// Build a client without touching the network.
    pub fn new(config: Tm1Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| Tm1Error::Config(format!("failed to build HTTP client: {}", e)))?;

        info!("TM1 client configured for {}", config.base_url);
        Ok(Self { http, config })
    }

    /// Build a client and verify the server answers.
    pub async fn connect(config: Tm1Config) -> Result<Self> {
        let client = Self::new(config)?;
        let version = client.product_version().await?;
        info!("Connected to TM1 server version {}", version);
        Ok(client)
    }

    pub async fn product_version(&self) -> Result<String> {
        let response = self.send(Method::GET, "Configuration/ProductVersion/$value", None).await?;
        Ok(response.text().await?.trim().to_string())
    }

    /// End the server-side session.
    pub async fn close(&self) -> Result<()> {
        self.send(Method::POST, "ActiveSession/tm1.Close", Some(&json!({}))).await?;
        info!("TM1 session closed");
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Response> {
        debug!("TM1 {} {}", method, path);

        let mut request = self.http.request(method, self.url(path));
        if !self.config.user.is_empty() {
            request = request.basic_auth(&self.config.user, Some(&self.config.password));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(Tm1Error::Remote {
            status: status.as_u16(),
            message: server_message(&message),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(Method::GET, path, None).await?;
        Ok(response.json::<T>().await?)
    }

    async fn get_names(&self, collection: &str) -> Result<Vec<String>> {
        let list: Collection<Named> = self.get_json(&format!("{}?$select=Name", collection)).await?;
        Ok(list.value.into_iter().map(|n| n.name).collect())
    }

    async fn dimension_exists(&self, dimension: &str) -> Result<bool> {
        let path = format!("{}?$select=Name", entity("Dimensions", dimension));
        match self.send(Method::GET, &path, None).await {
            Ok(_) => Ok(true),
            Err(e) if is_status(&e, StatusCode::NOT_FOUND) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Run an expanded cellset request, then release the server-side cellset.
    async fn fetch_cellset(&self, path: &str, body: &Value) -> Result<CellSet> {
        let response = self.send(Method::POST, path, Some(body)).await?;
        let raw: Value = response.json().await?;

        if let Some(id) = raw.get("ID").and_then(Value::as_str) {
            if let Err(e) = self.send(Method::DELETE, &entity("Cellsets", id), None).await {
                warn!("Failed to release cellset {}: {}", id, e);
            }
        }

        odata::parse_cellset(raw)
    }
}

fn is_status(err: &Tm1Error, status: StatusCode) -> bool {
    matches!(err, Tm1Error::Remote { status: s, .. } if *s == status.as_u16())
}

/// Rewrite a 404 into `NotFound` for the named object.
fn not_found_as(err: Tm1Error, kind: &'static str, name: &str) -> Tm1Error {
    if is_status(&err, StatusCode::NOT_FOUND) {
        Tm1Error::not_found(kind, name)
    } else {
        err
    }
}

/// Pull `error.message` out of an OData error body when there is one.
fn server_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl CubeSchemaResolver for Tm1Client {
    async fn cube_dimensions(&self, cube: &str) -> Result<Vec<String>> {
        #[derive(serde::Deserialize)]
        struct CubeDims {
            #[serde(rename = "Dimensions")]
            dimensions: Vec<Named>,
        }

        let path = format!("{}?$select=Name&$expand=Dimensions($select=Name)", entity("Cubes", cube));
        let body: CubeDims = self
            .get_json(&path)
            .await
            .map_err(|e| not_found_as(e, "cube", cube))?;
        Ok(body.dimensions.into_iter().map(|d| d.name).collect())
    }
}

#[async_trait]
impl DimensionMembershipOracle for Tm1Client {
    async fn element_exists(&self, dimension: &str, element: &str) -> Result<bool> {
        let path = format!(
            "{}/{}?$select=Name",
            odata::default_hierarchy(dimension),
            entity("Elements", element)
        );
        match self.send(Method::GET, &path, None).await {
            Ok(_) => Ok(true),
            Err(e) if is_status(&e, StatusCode::NOT_FOUND) => {
                if self.dimension_exists(dimension).await? {
                    Ok(false)
                } else {
                    Err(Tm1Error::not_found("dimension", dimension))
                }
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl CellWriter for Tm1Client {
    async fn write_cell(
        &self,
        cube: &str,
        dimensions: &[String],
        coordinate: &CoordinateTuple,
        value: &CellValue,
    ) -> Result<()> {
        let body = odata::cell_update(dimensions, coordinate, value)?;
        let path = format!("{}/tm1.Update", entity("Cubes", cube));
        self.send(Method::POST, &path, Some(&body))
            .await
            .map_err(|e| not_found_as(e, "cube", cube))?;
        Ok(())
    }

    async fn write_cells(&self, cube: &str, dimensions: &[String], request: &BulkWriteRequest) -> Result<()> {
        let body = odata::bulk_update(dimensions, request)?;
        let path = format!("{}/tm1.Update", entity("Cubes", cube));
        self.send(Method::POST, &path, Some(&body))
            .await
            .map_err(|e| not_found_as(e, "cube", cube))?;
        Ok(())
    }
}

#[async_trait]
impl ProcedureStore for Tm1Client {
    async fn get_procedure(&self, name: &str) -> Result<Procedure> {
        let path = format!("{}?{}", entity("Processes", name), PROCEDURE_SELECT);
        self.get_json(&path)
            .await
            .map_err(|e| not_found_as(e, "procedure", name))
    }

    async fn update_procedure(&self, procedure: &Procedure) -> Result<()> {
        let body = serde_json::to_value(procedure)?;
        self.send(Method::PATCH, &entity("Processes", &procedure.name), Some(&body))
            .await
            .map_err(|e| not_found_as(e, "procedure", &procedure.name))?;
        Ok(())
    }
}

#[async_trait]
impl MetadataService for Tm1Client {
    async fn cube_names(&self) -> Result<Vec<String>> {
        self.get_names("Cubes").await
    }

    async fn create_cube(&self, cube: &Cube) -> Result<()> {
        let binds: Vec<String> = cube.dimensions.iter().map(|d| entity("Dimensions", d)).collect();
        let body = json!({ "Name": cube.name, "Dimensions@odata.bind": binds });
        self.send(Method::POST, "Cubes", Some(&body)).await?;
        info!("Created cube {} with {} dimension(s)", cube.name, cube.dimensions.len());
        Ok(())
    }

    async fn delete_cube(&self, name: &str) -> Result<()> {
        self.send(Method::DELETE, &entity("Cubes", name), None)
            .await
            .map_err(|e| not_found_as(e, "cube", name))?;
        info!("Deleted cube {}", name);
        Ok(())
    }

    async fn dimension_names(&self) -> Result<Vec<String>> {
        self.get_names("Dimensions").await
    }

    async fn get_dimension(&self, name: &str) -> Result<Dimension> {
        let path = format!("{}/Elements?$select=Name,Type", odata::default_hierarchy(name));
        let list: Collection<Element> = self
            .get_json(&path)
            .await
            .map_err(|e| not_found_as(e, "dimension", name))?;
        Ok(Dimension {
            name: name.to_string(),
            elements: list.value,
        })
    }

    async fn create_dimension(&self, name: &str) -> Result<Dimension> {
        let body = json!({ "Name": name, "Hierarchies": [{ "Name": name }] });
        self.send(Method::POST, "Dimensions", Some(&body)).await?;
        info!("Created dimension {}", name);
        Ok(Dimension {
            name: name.to_string(),
            elements: Vec::new(),
        })
    }

    async fn delete_dimension(&self, name: &str) -> Result<()> {
        self.send(Method::DELETE, &entity("Dimensions", name), None)
            .await
            .map_err(|e| not_found_as(e, "dimension", name))?;
        info!("Deleted dimension {}", name);
        Ok(())
    }

    async fn add_elements(&self, dimension: &str, elements: &[String], element_type: ElementType) -> Result<Dimension> {
        let path = format!("{}/Elements", odata::default_hierarchy(dimension));
        for element in elements {
            if self.element_exists(dimension, element).await? {
                debug!("Element {} already in {}, skipping", element, dimension);
                continue;
            }
            let body = json!({ "Name": element, "Type": element_type.as_str() });
            self.send(Method::POST, &path, Some(&body)).await?;
        }
        info!("Added {} element(s) to {}", elements.len(), dimension);
        self.get_dimension(dimension).await
    }

    async fn execute_view(&self, cube: &str, view: &str) -> Result<CellSet> {
        let path = format!(
            "{}/{}/tm1.Execute?{}",
            entity("Cubes", cube),
            entity("Views", view),
            odata::CELLSET_EXPAND
        );
        self.fetch_cellset(&path, &json!({}))
            .await
            .map_err(|e| not_found_as(e, "view", &format!("{}/{}", cube, view)))
    }

    async fn execute_mdx(&self, mdx: &str) -> Result<CellSet> {
        let path = format!("ExecuteMDX?{}", odata::CELLSET_EXPAND);
        self.fetch_cellset(&path, &json!({ "MDX": mdx })).await
    }

    async fn procedure_names(&self) -> Result<Vec<String>> {
        self.get_names("Processes").await
    }

    async fn delete_procedure(&self, name: &str) -> Result<()> {
        self.send(Method::DELETE, &entity("Processes", name), None)
            .await
            .map_err(|e| not_found_as(e, "procedure", name))?;
        info!("Deleted procedure {}", name);
        Ok(())
    }

    async fn chores(&self) -> Result<Vec<Chore>> {
        let list: Collection<Chore> = self.get_json(&format!("Chores?{}", CHORE_SELECT)).await?;
        Ok(list.value)
    }

    async fn get_chore(&self, name: &str) -> Result<Chore> {
        let path = format!("{}?{}", entity("Chores", name), CHORE_SELECT);
        self.get_json(&path)
            .await
            .map_err(|e| not_found_as(e, "chore", name))
    }

    async fn set_chore_active(&self, name: &str, active: bool) -> Result<()> {
        let action = if active { "tm1.Activate" } else { "tm1.Deactivate" };
        let path = format!("{}/{}", entity("Chores", name), action);
        self.send(Method::POST, &path, Some(&json!({})))
            .await
            .map_err(|e| not_found_as(e, "chore", name))?;
        info!("Chore {} {}", name, if active { "activated" } else { "deactivated" });
        Ok(())
    }
}
