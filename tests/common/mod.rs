//! Shared helpers for integration tests.
//!
//! `FakeTm1` is an in-memory server implementing every backend capability.
//! It counts reads and mutations so tests can assert what was (not) called.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use tm1_agency::backend::{CellWriter, CubeSchemaResolver, DimensionMembershipOracle, MetadataService, ProcedureStore};
use tm1_agency::error::{Result, Tm1Error};
use tm1_agency::model::{
    BulkWriteRequest, CellSet, CellValue, Chore, CoordinateTuple, Cube, Dimension, Element, ElementType, Procedure,
};

pub const PROLOG: &str = "nRows = 0;\n";
pub const METADATA: &str = "# metadata\n";
pub const DATA: &str = "nRows = nRows + 1;\n";
pub const EPILOG: &str = "LogOutput('INFO', 'done');\n";

#[derive(Default)]
pub struct FakeTm1 {
    pub cubes: Mutex<HashMap<String, Vec<String>>>,
    pub dimensions: Mutex<HashMap<String, Vec<Element>>>,
    pub cells: Mutex<HashMap<(String, Vec<String>), CellValue>>,
    pub procedures: Mutex<HashMap<String, Procedure>>,
    pub chores: Mutex<Vec<Chore>>,

    pub single_writes: AtomicUsize,
    pub bulk_writes: AtomicUsize,
    pub membership_checks: AtomicUsize,
    pub procedure_reads: AtomicUsize,
    pub procedure_updates: AtomicUsize,

    /// Make every cell write fail like a server-side error
    pub fail_writes: AtomicBool,
}

impl FakeTm1 {
    /// Cube `Sales` over Month x City x Measure, plus one procedure and one chore.
    pub fn sales() -> Self {
        let fake = FakeTm1::default();
        fake.add_dimension("Month", &["Jan", "Feb"], ElementType::Numeric);
        fake.add_dimension("City", &["Tokyo", "Cairo"], ElementType::Numeric);
        fake.add_dimension("Measure", &["Revenue"], ElementType::Numeric);
        fake.cubes.lock().unwrap().insert(
            "Sales".to_string(),
            vec!["Month".to_string(), "City".to_string(), "Measure".to_string()],
        );

        fake.procedures.lock().unwrap().insert(
            "load.sales".to_string(),
            Procedure {
                name: "load.sales".to_string(),
                prolog: PROLOG.to_string(),
                metadata: METADATA.to_string(),
                data: DATA.to_string(),
                epilog: EPILOG.to_string(),
            },
        );
        fake.chores.lock().unwrap().push(Chore {
            name: "nightly.load".to_string(),
            active: false,
            start_time: Some("2024-01-01T02:00Z".to_string()),
            frequency: Some("P1DT00H00M00S".to_string()),
        });
        fake
    }

    pub fn add_dimension(&self, name: &str, elements: &[&str], element_type: ElementType) {
        self.dimensions.lock().unwrap().insert(
            name.to_string(),
            elements.iter().map(|e| Element::new(*e, element_type)).collect(),
        );
    }

    pub fn cell(&self, cube: &str, coordinate: &[&str]) -> Option<CellValue> {
        let key = (cube.to_string(), coordinate.iter().map(|s| s.to_string()).collect());
        self.cells.lock().unwrap().get(&key).cloned()
    }

    pub fn procedure(&self, name: &str) -> Option<Procedure> {
        self.procedures.lock().unwrap().get(name).cloned()
    }

    pub fn mutations(&self) -> usize {
        self.single_writes.load(Ordering::SeqCst) + self.bulk_writes.load(Ordering::SeqCst)
    }

    fn store_cell(&self, cube: &str, coordinate: &CoordinateTuple, value: &CellValue) {
        let key = (cube.to_string(), coordinate.as_slice().to_vec());
        self.cells.lock().unwrap().insert(key, value.clone());
    }

    fn check_write(&self, cube: &str, dimensions: &[String]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Tm1Error::Remote {
                status: 500,
                message: "write rejected by server".to_string(),
            });
        }
        match self.cubes.lock().unwrap().get(cube) {
            Some(dims) if dims.as_slice() == dimensions => Ok(()),
            Some(_) => Err(Tm1Error::invalid_argument("dimension order mismatch")),
            None => Err(Tm1Error::not_found("cube", cube)),
        }
    }
}

#[async_trait]
impl CubeSchemaResolver for FakeTm1 {
    async fn cube_dimensions(&self, cube: &str) -> Result<Vec<String>> {
        self.cubes
            .lock()
            .unwrap()
            .get(cube)
            .cloned()
            .ok_or_else(|| Tm1Error::not_found("cube", cube))
    }
}

#[async_trait]
impl DimensionMembershipOracle for FakeTm1 {
    async fn element_exists(&self, dimension: &str, element: &str) -> Result<bool> {
        self.membership_checks.fetch_add(1, Ordering::SeqCst);
        self.dimensions
            .lock()
            .unwrap()
            .get(dimension)
            .map(|els| els.iter().any(|e| e.name == element))
            .ok_or_else(|| Tm1Error::not_found("dimension", dimension))
    }
}

#[async_trait]
impl CellWriter for FakeTm1 {
    async fn write_cell(
        &self,
        cube: &str,
        dimensions: &[String],
        coordinate: &CoordinateTuple,
        value: &CellValue,
    ) -> Result<()> {
        self.single_writes.fetch_add(1, Ordering::SeqCst);
        self.check_write(cube, dimensions)?;
        self.store_cell(cube, coordinate, value);
        Ok(())
    }

    async fn write_cells(&self, cube: &str, dimensions: &[String], request: &BulkWriteRequest) -> Result<()> {
        self.bulk_writes.fetch_add(1, Ordering::SeqCst);
        self.check_write(cube, dimensions)?;
        for (coordinate, value) in request.iter() {
            self.store_cell(cube, coordinate, value);
        }
        Ok(())
    }
}

#[async_trait]
impl ProcedureStore for FakeTm1 {
    async fn get_procedure(&self, name: &str) -> Result<Procedure> {
        self.procedure_reads.fetch_add(1, Ordering::SeqCst);
        self.procedure(name).ok_or_else(|| Tm1Error::not_found("procedure", name))
    }

    async fn update_procedure(&self, procedure: &Procedure) -> Result<()> {
        self.procedure_updates.fetch_add(1, Ordering::SeqCst);
        let mut procedures = self.procedures.lock().unwrap();
        match procedures.get_mut(&procedure.name) {
            Some(existing) => {
                *existing = procedure.clone();
                Ok(())
            }
            None => Err(Tm1Error::not_found("procedure", &procedure.name)),
        }
    }
}

#[async_trait]
impl MetadataService for FakeTm1 {
    async fn cube_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.cubes.lock().unwrap().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn create_cube(&self, cube: &Cube) -> Result<()> {
        let dimensions = self.dimensions.lock().unwrap();
        if let Some(missing) = cube.dimensions.iter().find(|d| !dimensions.contains_key(*d)) {
            return Err(Tm1Error::not_found("dimension", missing.as_str()));
        }
        self.cubes.lock().unwrap().insert(cube.name.clone(), cube.dimensions.clone());
        Ok(())
    }

    async fn delete_cube(&self, name: &str) -> Result<()> {
        self.cubes
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Tm1Error::not_found("cube", name))
    }

    async fn dimension_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.dimensions.lock().unwrap().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn get_dimension(&self, name: &str) -> Result<Dimension> {
        self.dimensions
            .lock()
            .unwrap()
            .get(name)
            .map(|elements| Dimension {
                name: name.to_string(),
                elements: elements.clone(),
            })
            .ok_or_else(|| Tm1Error::not_found("dimension", name))
    }

    async fn create_dimension(&self, name: &str) -> Result<Dimension> {
        self.dimensions.lock().unwrap().insert(name.to_string(), Vec::new());
        Ok(Dimension {
            name: name.to_string(),
            elements: Vec::new(),
        })
    }

    async fn delete_dimension(&self, name: &str) -> Result<()> {
        self.dimensions
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Tm1Error::not_found("dimension", name))
    }

    async fn add_elements(&self, dimension: &str, elements: &[String], element_type: ElementType) -> Result<Dimension> {
        {
            let mut dimensions = self.dimensions.lock().unwrap();
            let existing = dimensions
                .get_mut(dimension)
                .ok_or_else(|| Tm1Error::not_found("dimension", dimension))?;
            for name in elements {
                if !existing.iter().any(|e| &e.name == name) {
                    existing.push(Element::new(name.clone(), element_type));
                }
            }
        }
        self.get_dimension(dimension).await
    }

    async fn execute_view(&self, cube: &str, view: &str) -> Result<CellSet> {
        if !self.cubes.lock().unwrap().contains_key(cube) || view != "Default" {
            return Err(Tm1Error::not_found("view", format!("{}/{}", cube, view)));
        }
        Ok(CellSet {
            columns: vec![vec!["Jan".to_string()], vec!["Feb".to_string()]],
            rows: vec![vec!["Tokyo".to_string(), "Revenue".to_string()]],
            values: vec![vec![Some(serde_json::json!(100)), None]],
        })
    }

    async fn execute_mdx(&self, _mdx: &str) -> Result<CellSet> {
        Ok(CellSet::default())
    }

    async fn procedure_names(&self) -> Result<Vec<String>> {
        Ok(self.procedures.lock().unwrap().keys().cloned().collect())
    }

    async fn delete_procedure(&self, name: &str) -> Result<()> {
        self.procedures
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Tm1Error::not_found("procedure", name))
    }

    async fn chores(&self) -> Result<Vec<Chore>> {
        Ok(self.chores.lock().unwrap().clone())
    }

    async fn get_chore(&self, name: &str) -> Result<Chore> {
        self.chores
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.name == name)
            .cloned()
            .ok_or_else(|| Tm1Error::not_found("chore", name))
    }

    async fn set_chore_active(&self, name: &str, active: bool) -> Result<()> {
        let mut chores = self.chores.lock().unwrap();
        let chore = chores
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| Tm1Error::not_found("chore", name))?;
        chore.active = active;
        Ok(())
    }
}

pub fn coord(parts: &[&str]) -> CoordinateTuple {
    CoordinateTuple::new(parts.iter().copied()).unwrap()
}
