#![allow(dead_code)]

//! Patient records, an in-memory store and a capturing PHI environment
//! shared by the integration tests.

use parking_lot::Mutex;
use phi_access::{
    Catalog, Guard, GuardedRecord, ModelBuilder, Phi, PhiAccessError, PhiConfig, Request,
};
use phi_access_log::MemorySink;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub const DETAIL: &str = "Generic Spell";
pub const ADDRESS: &str = "123 Little Whinging";

/// Register every record type used by the tests.
pub fn register(phi: &Phi) -> Result<(), PhiAccessError> {
    phi.register(
        ModelBuilder::new(PatientInfo::MODEL)
            .attributes([
                "id",
                "first_name",
                "last_name",
                "public_id",
                "created_at",
                "updated_at",
            ])
            .methods(["birthday", "summary_json", "detail_json"])
            .relations(["patient_detail", "address", "health_records"])
            .extend_phi_access(["patient_detail", "health_records"])
            .exclude_from_phi(["last_name"])
            .include_in_phi(["birthday"]),
    )?;
    phi.register(
        ModelBuilder::new(PatientDetail::MODEL).attributes([
            "id",
            "patient_info_id",
            "detail",
            "created_at",
            "updated_at",
        ]),
    )?;
    phi.register(
        ModelBuilder::new(Address::MODEL)
            .attributes(["id", "patient_info_id", "address"])
            .methods(["inlined"]),
    )?;
    phi.register(
        ModelBuilder::new(HealthRecord::MODEL).attributes(["id", "patient_info_id", "data"]),
    )?;
    Ok(())
}

/// Whether `result` is an access denial.
pub fn denied<T>(result: Result<T, PhiAccessError>) -> bool {
    matches!(result, Err(PhiAccessError::AccessDenied { .. }))
}

/// Read the detail of `patient` through its extending relation.
pub fn detail_of(patient: &PatientInfo) -> Result<String, PhiAccessError> {
    patient
        .patient_detail()
        .expect("patient has a detail record")
        .detail()
}

/// A PHI environment whose audit lines are captured in memory.
pub struct Fixture {
    pub phi: Phi,
    pub sink: MemorySink,
    pub request: Request,
    pub db: Db,
}

impl Fixture {
    pub fn new() -> anyhow::Result<Self> {
        Self::with(PhiConfig::default(), Catalog::new("en"))
    }

    pub fn with(config: PhiConfig, catalog: Catalog) -> anyhow::Result<Self> {
        let sink = MemorySink::new();
        let phi = Phi::builder(config)
            .log_sink(sink.clone())
            .translator(catalog)
            .build()?;
        register(&phi)?;
        let request = phi.request();

        Ok(Self {
            phi,
            sink,
            request,
            db: Db::default(),
        })
    }

    /// An unsaved patient.
    pub fn build(&self, row: PatientRow) -> anyhow::Result<Arc<PatientInfo>> {
        Ok(PatientInfo::load(&self.request, None, row)?)
    }

    /// A saved patient.
    pub fn create(&self, row: PatientRow) -> anyhow::Result<Arc<PatientInfo>> {
        let patient = self.build(row)?;
        self.db.save(&patient);
        Ok(patient)
    }

    pub fn find(&self, id: u64) -> anyhow::Result<Arc<PatientInfo>> {
        self.db.find(&self.request, id)
    }

    pub fn address(&self, address: &str) -> anyhow::Result<Arc<Address>> {
        Ok(Arc::new(Address {
            guard: Guard::new(&self.request, Address::MODEL)?,
            address: address.to_owned(),
        }))
    }
}

/// Stored columns of a patient and its related records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientRow {
    pub first_name: String,
    pub last_name: String,
    pub public_id: String,
    pub detail: Option<String>,
    pub address: Option<String>,
    pub health_records: Vec<String>,
}

impl PatientRow {
    pub fn named(first_name: &str) -> Self {
        Self {
            first_name: first_name.to_owned(),
            last_name: "Weasley".to_owned(),
            public_id: format!("public-{}", first_name.to_lowercase()),
            detail: Some(DETAIL.to_owned()),
            address: Some(ADDRESS.to_owned()),
            health_records: Vec::new(),
        }
    }

    pub fn detail(mut self, detail: &str) -> Self {
        self.detail = Some(detail.to_owned());
        self
    }

    pub fn without_detail(mut self) -> Self {
        self.detail = None;
        self
    }

    pub fn health_records(mut self, count: usize) -> Self {
        self.health_records = (1..=count)
            .map(|index| format!("I'm sure this is a quote #{index}"))
            .collect();
        self
    }
}

#[derive(Debug)]
struct PatientState {
    id: Option<u64>,
    first_name: String,
    last_name: String,
    public_id: String,
    patient_detail: Option<Arc<PatientDetail>>,
    address: Option<Arc<Address>>,
    health_records: Vec<Arc<HealthRecord>>,
}

pub struct PatientInfo {
    guard: Guard,
    state: Mutex<PatientState>,
}

impl GuardedRecord for PatientInfo {
    const MODEL: &'static str = "PatientInfo";

    fn guard(&self) -> &Guard {
        &self.guard
    }
}

impl PatientInfo {
    /// An unsaved patient loaded in `request`.
    pub fn build_in(request: &Request, row: PatientRow) -> Result<Arc<Self>, PhiAccessError> {
        Self::load(request, None, row)
    }

    fn load(request: &Request, id: Option<u64>, row: PatientRow) -> Result<Arc<Self>, PhiAccessError> {
        let guard = Guard::new(request, Self::MODEL)?;
        if let Some(id) = id {
            guard.mark_persisted(id);
        }
        let state = PatientState::load(request, id, row)?;

        Ok(Arc::new(Self {
            guard,
            state: Mutex::new(state),
        }))
    }

    pub fn id(&self) -> Option<u64> {
        self.state.lock().id
    }

    pub fn first_name(&self) -> Result<String, PhiAccessError> {
        self.guard
            .read("first_name", || self.state.lock().first_name.clone())
    }

    pub fn last_name(&self) -> Result<String, PhiAccessError> {
        self.guard
            .read("last_name", || self.state.lock().last_name.clone())
    }

    pub fn public_id(&self) -> Result<String, PhiAccessError> {
        self.guard
            .read("public_id", || self.state.lock().public_id.clone())
    }

    pub fn birthday(&self) -> Result<String, PhiAccessError> {
        self.guard.read("birthday", || "1980-03-01".to_owned())
    }

    pub fn summary_json(&self) -> Result<Value, PhiAccessError> {
        Ok(json!({
            "id": self.public_id()?,
            "first": self.first_name()?,
            "last": self.last_name()?,
        }))
    }

    pub fn detail_json(&self) -> Result<Value, PhiAccessError> {
        let mut summary = self.summary_json()?;
        let detail = match self.patient_detail() {
            Some(detail) => Some(detail.detail()?),
            None => None,
        };
        summary["detail"] = json!(detail);
        summary["health_record_count"] = json!(self.health_records().len());
        Ok(summary)
    }

    pub fn patient_detail(&self) -> Option<Arc<PatientDetail>> {
        let detail = self.state.lock().patient_detail.clone();
        self.guard.relation("patient_detail", detail)
    }

    pub fn address(&self) -> Option<Arc<Address>> {
        let address = self.state.lock().address.clone();
        self.guard.relation("address", address)
    }

    pub fn health_records(&self) -> Vec<Arc<HealthRecord>> {
        let records = self.state.lock().health_records.clone();
        self.guard.relation("health_records", records)
    }

    /// Re-read the stored row, replacing every related record.
    pub fn reload(&self, db: &Db) -> anyhow::Result<()> {
        let id = self
            .id()
            .ok_or_else(|| anyhow::anyhow!("cannot reload an unsaved patient"))?;
        let row = db.row(id)?;
        let state = PatientState::load(self.guard.request(), Some(id), row)?;

        *self.state.lock() = state;
        self.guard.reload();
        Ok(())
    }

    fn row(&self) -> PatientRow {
        let state = self.state.lock();
        PatientRow {
            first_name: state.first_name.clone(),
            last_name: state.last_name.clone(),
            public_id: state.public_id.clone(),
            detail: state
                .patient_detail
                .as_ref()
                .map(|detail| detail.detail.clone()),
            address: state
                .address
                .as_ref()
                .map(|address| address.address.clone()),
            health_records: state
                .health_records
                .iter()
                .map(|record| record.data.clone())
                .collect(),
        }
    }
}

impl PatientState {
    fn load(request: &Request, id: Option<u64>, row: PatientRow) -> Result<Self, PhiAccessError> {
        let persist = |guard: &Guard, suffix: &str| {
            if let Some(id) = id {
                guard.mark_persisted(format!("{id}{suffix}"));
            }
        };

        let patient_detail = match row.detail {
            Some(detail) => {
                let guard = Guard::new(request, PatientDetail::MODEL)?;
                persist(&guard, "");
                Some(Arc::new(PatientDetail { guard, detail }))
            }
            None => None,
        };
        let address = match row.address {
            Some(address) => {
                let guard = Guard::new(request, Address::MODEL)?;
                persist(&guard, "");
                Some(Arc::new(Address { guard, address }))
            }
            None => None,
        };
        let health_records = row
            .health_records
            .into_iter()
            .enumerate()
            .map(|(index, data)| -> Result<_, PhiAccessError> {
                let guard = Guard::new(request, HealthRecord::MODEL)?;
                persist(&guard, &format!("-{index}"));
                Ok(Arc::new(HealthRecord { guard, data }))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id,
            first_name: row.first_name,
            last_name: row.last_name,
            public_id: row.public_id,
            patient_detail,
            address,
            health_records,
        })
    }
}

#[derive(Debug)]
pub struct PatientDetail {
    guard: Guard,
    detail: String,
}

impl GuardedRecord for PatientDetail {
    const MODEL: &'static str = "PatientDetail";

    fn guard(&self) -> &Guard {
        &self.guard
    }
}

impl PatientDetail {
    pub fn detail(&self) -> Result<String, PhiAccessError> {
        self.guard.read("detail", || self.detail.clone())
    }
}

#[derive(Debug)]
pub struct Address {
    guard: Guard,
    address: String,
}

impl GuardedRecord for Address {
    const MODEL: &'static str = "Address";

    fn guard(&self) -> &Guard {
        &self.guard
    }
}

impl Address {
    pub fn address(&self) -> Result<String, PhiAccessError> {
        self.guard.read("address", || self.address.clone())
    }

    /// Only reads the guarded column when there is nothing to use instead.
    pub fn inlined(&self, avoid_phi: Option<&str>) -> Result<String, PhiAccessError> {
        match avoid_phi {
            Some(value) => Ok(value.to_owned()),
            None => self.address(),
        }
    }
}

#[derive(Debug)]
pub struct HealthRecord {
    guard: Guard,
    data: String,
}

impl GuardedRecord for HealthRecord {
    const MODEL: &'static str = "HealthRecord";

    fn guard(&self) -> &Guard {
        &self.guard
    }
}

impl HealthRecord {
    pub fn data(&self) -> Result<String, PhiAccessError> {
        self.guard.read("data", || self.data.clone())
    }
}

/// Patients by primary key.
#[derive(Debug, Default)]
pub struct Db {
    rows: Mutex<HashMap<u64, PatientRow>>,
    next_id: AtomicU64,
}

impl Db {
    /// Store `patient`, assigning a key on first save.
    pub fn save(&self, patient: &PatientInfo) -> u64 {
        let id = {
            let mut state = patient.state.lock();
            *state
                .id
                .get_or_insert_with(|| self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
        };
        patient.guard.mark_persisted(id);
        self.rows.lock().insert(id, patient.row());
        id
    }

    pub fn row(&self, id: u64) -> anyhow::Result<PatientRow> {
        self.rows
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no patient with id {id}"))
    }

    /// A fresh instance of a stored patient.
    pub fn find(&self, request: &Request, id: u64) -> anyhow::Result<Arc<PatientInfo>> {
        Ok(PatientInfo::load(request, Some(id), self.row(id)?)?)
    }
}
