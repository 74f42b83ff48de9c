//! Клиент удалённых сервисов: штрафы, журнал удалений, пропуска, проверки ТС.

use crate::{
    backend::{normalize_vin, VehicleKey},
    config::{Config, DeletePolicy},
    error::{FinecrmError, Result},
    gibdd::{GibddCheck, GibddQuery},
    model::{DeletedFine, DeletionAudit, Fine, FineRequest, FineUpdate, IssuedPass, ParkingPass, PlateLookup, VinLookup},
    parking::NewPass,
    traits::{FineStore, PassStore, VehicleLookup},
    wire::{self, ErrorBody, FinesEnvelope, HistoryEnvelope, IssuedPassBody, PassesEnvelope, PlateBody},
};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

pub struct HttpBackend {
    client: Client,
    fines_url: Url,
    extended_url: Url,
    vehicle_check_url: Option<Url>,
    gibdd_url: Url,
    delete_policy: DeletePolicy,
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| FinecrmError::Parse(format!("invalid url {raw:?}: {e}")))
}

impl HttpBackend {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = Client::builder().timeout(cfg.timeout).build()?;
        Self::with_client(cfg, client)
    }

    /// Конструктор с готовым [`Client`], например без системного прокси.
    pub fn with_client(cfg: &Config, client: Client) -> Result<Self> {
        Ok(HttpBackend {
            client,
            fines_url: parse_url(&cfg.fines_url)?,
            extended_url: parse_url(&cfg.extended_url)?,
            vehicle_check_url: cfg.vehicle_check_url.as_deref().map(parse_url).transpose()?,
            gibdd_url: parse_url(&cfg.gibdd_url)?,
            delete_policy: cfg.delete_policy,
        })
    }

    /// Ответ не 2xx превращается в [`FinecrmError::Remote`] с текстом из `{"error": ...}`.
    fn send(&self, req: RequestBuilder) -> Result<Response> {
        let resp = req.send()?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body: ErrorBody = resp.json().unwrap_or_default();
        Err(FinecrmError::Remote {
            status: status.as_u16(),
            message: body.into_message(status.canonical_reason().unwrap_or("request failed")),
        })
    }

    fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let resp = self.send(req)?;
        Ok(resp.json()?)
    }

    fn id_param(id: i64) -> [(&'static str, String); 1] {
        [("id", id.to_string())]
    }
}

impl FineStore for HttpBackend {
    #[instrument(skip(self))]
    fn list_fines(&self) -> Result<Vec<Fine>> {
        debug!(url = %self.fines_url, "GET fines");
        let env: FinesEnvelope = self.send_json(self.client.get(self.fines_url.clone()))?;
        Ok(env.fines)
    }

    #[instrument(skip(self, req), fields(number = %req.violation_number))]
    fn add_fine(&self, req: &FineRequest) -> Result<()> {
        self.send(self.client.post(self.fines_url.clone()).json(req))?;
        Ok(())
    }

    #[instrument(skip(self))]
    fn update_fine(&self, id: i64, update: &FineUpdate) -> Result<()> {
        self.send(
            self.client
                .put(self.fines_url.clone())
                .query(&Self::id_param(id))
                .json(update),
        )?;
        Ok(())
    }

    #[instrument(skip(self, audit))]
    fn delete_fine(&self, id: i64, audit: &DeletionAudit) -> Result<()> {
        match self.delete_policy {
            DeletePolicy::Soft => self.update_fine(id, &FineUpdate::soft_delete(audit)),
            DeletePolicy::Hard => {
                self.send(self.client.delete(self.fines_url.clone()).query(&Self::id_param(id)))?;
                Ok(())
            }
        }
    }

    #[instrument(skip(self))]
    fn deletion_history(&self) -> Result<Vec<DeletedFine>> {
        let env: HistoryEnvelope = self.send_json(
            self.client
                .get(self.extended_url.clone())
                .query(&[("action", "history")]),
        )?;
        Ok(env.history)
    }
}

impl PassStore for HttpBackend {
    #[instrument(skip(self))]
    fn list_passes(&self) -> Result<Vec<ParkingPass>> {
        let env: PassesEnvelope = self.send_json(
            self.client
                .get(self.extended_url.clone())
                .query(&[("action", "parking")]),
        )?;
        Ok(env.passes)
    }

    #[instrument(skip(self, pass), fields(plate = %pass.license_plate))]
    fn issue_pass(&self, pass: &NewPass) -> Result<IssuedPass> {
        pass.validate()?;
        let body: IssuedPassBody = self.send_json(
            self.client
                .post(self.extended_url.clone())
                .query(&[("action", "parking")])
                .json(pass),
        )?;
        match (body.success, body.pass_number) {
            (true, Some(pass_number)) => Ok(IssuedPass { id: body.id, pass_number }),
            _ => Err(FinecrmError::Remote {
                status: 200,
                message: "пропуск не создан".into(),
            }),
        }
    }

    #[instrument(skip(self))]
    fn remove_pass(&self, id: i64) -> Result<()> {
        self.send(
            self.client
                .delete(self.extended_url.clone())
                .query(&[("action", "parking".to_string()), ("id", id.to_string())]),
        )?;
        Ok(())
    }
}

impl VehicleLookup for HttpBackend {
    #[instrument(skip(self))]
    fn lookup_vin(&self, vin: &str) -> Result<VinLookup> {
        let vin = normalize_vin(vin)?;
        let body: serde_json::Value = self.send_json(
            self.client
                .post(self.extended_url.clone())
                .query(&[("action", "vin")])
                .json(&serde_json::json!({ "vinCode": vin })),
        )?;
        wire::vin_lookup_from_json(body)
    }

    #[instrument(skip(self))]
    fn lookup_registration(&self, key: &VehicleKey) -> Result<PlateLookup> {
        let (param, value) = key.normalized()?;
        let url = self
            .vehicle_check_url
            .clone()
            .ok_or_else(|| FinecrmError::Validation("vehicle check url is not configured".into()))?;
        let body: PlateBody = self.send_json(self.client.get(url).query(&[(param, value)]))?;
        body.into_lookup()
    }

    #[instrument(skip(self))]
    fn gibdd_check(&self, license_number: &str, sts_number: &str) -> Result<GibddCheck> {
        let query = GibddQuery::new(license_number, sts_number)?;
        debug!(url = %self.gibdd_url, "POST gibdd check");
        self.send_json(self.client.post(self.gibdd_url.clone()).json(&query))
    }
}
