use rnr_model::Registration;

#[derive(Clone, Debug, Default)]
pub struct ClientConfig {
    /// Orchestrator base URL, e.g. `https://ci.example.com`.
    pub address: String,
    pub uuid: String,
    pub token: String,
    /// Skip TLS certificate verification.
    pub insecure: bool,
    /// Reported to the orchestrator on declare.
    pub version: String,
}

impl ClientConfig {
    pub fn from_registration(reg: &Registration, insecure: bool) -> Self {
        Self {
            address: reg.address.clone(),
            uuid: reg.uuid.clone(),
            token: reg.token.clone(),
            insecure,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
