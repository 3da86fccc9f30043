use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use snmp2::{AsyncSession, Error as Snmp2Error, Oid as Snmp2Oid, Value as Snmp2Value};

use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::targets;
use crate::{Error, SnmpAddress};

const MAX_OIDS_PER_GET: usize = 24;
const DEFAULT_WALK_LIMIT: usize = 64;
// v1 agents signal the end of the MIB view with error-status noSuchName.
const ERROR_STATUS_NO_SUCH_NAME: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    Discovery,
    Query,
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Discovery => f.write_str("discovery"),
            Profile::Query => f.write_str("query"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SnmpConfig {
    pub community: String,
    pub timeout: Duration,
    pub retries: u32,
}

impl Default for SnmpConfig {
    fn default() -> Self {
        Self {
            community: "public".to_string(),
            timeout: Duration::from_secs(2),
            retries: 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SnmpProfiles {
    pub discovery: SnmpConfig,
    pub query: SnmpConfig,
}

impl SnmpProfiles {
    pub fn config(&self, profile: Profile) -> &SnmpConfig {
        match profile {
            Profile::Discovery => &self.discovery,
            Profile::Query => &self.query,
        }
    }
}

impl Default for SnmpProfiles {
    fn default() -> Self {
        Self {
            discovery: SnmpConfig {
                timeout: Duration::from_millis(500),
                retries: 0,
                ..SnmpConfig::default()
            },
            query: SnmpConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SnmpRequest {
    pub address: SnmpAddress,
    pub oids: Vec<Oid>,
    pub profile: Profile,
}

impl SnmpRequest {
    pub fn new(address: SnmpAddress, oids: Vec<Oid>) -> Self {
        Self {
            address,
            oids,
            profile: Profile::Query,
        }
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }
}

#[derive(Debug, Clone)]
pub struct SnmpWalkRequest {
    pub address: SnmpAddress,
    pub root_oid: Oid,
    pub max_results: usize,
    pub profile: Profile,
}

impl SnmpWalkRequest {
    pub fn new(address: SnmpAddress, root_oid: Oid) -> Self {
        Self {
            address,
            root_oid,
            max_results: DEFAULT_WALK_LIMIT,
            profile: Profile::Query,
        }
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }
}

#[derive(Debug, Clone)]
pub struct SnmpSetRequest {
    pub address: SnmpAddress,
    pub bindings: Vec<SnmpVarBind>,
    pub profile: Profile,
}

impl SnmpSetRequest {
    pub fn new(address: SnmpAddress, bindings: Vec<SnmpVarBind>) -> Self {
        Self {
            address,
            bindings,
            profile: Profile::Query,
        }
    }
}

pub type FlatResult = BTreeMap<Oid, SnmpValue>;

#[derive(Debug, Clone)]
pub struct SnmpResponse {
    pub address: SnmpAddress,
    pub varbinds: Vec<SnmpVarBind>,
}

impl SnmpResponse {
    pub fn into_flat(self) -> FlatResult {
        self.varbinds
            .into_iter()
            .map(|varbind| (varbind.oid, varbind.value))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnmpVarBind {
    pub oid: Oid,
    pub value: SnmpValue,
}

impl SnmpVarBind {
    pub fn new(oid: Oid, value: SnmpValue) -> Self {
        Self { oid, value }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Oid(pub Vec<u32>);

impl Oid {
    pub fn from_slice(slice: &[u32]) -> Self {
        Self(slice.to_vec())
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn join(&self, suffix: &[u32]) -> Oid {
        let mut arcs = Vec::with_capacity(self.0.len() + suffix.len());
        arcs.extend_from_slice(&self.0);
        arcs.extend_from_slice(suffix);
        Oid(arcs)
    }

    /// Strict descendant check: an OID is not its own descendant.
    pub fn is_descendant_of(&self, root: &Oid) -> bool {
        self.0.len() > root.0.len() && self.0[..root.0.len()] == root.0[..]
    }

    pub fn tail(&self, count: usize) -> &[u32] {
        let start = self.0.len().saturating_sub(count);
        &self.0[start..]
    }
}

impl From<Vec<u32>> for Oid {
    fn from(value: Vec<u32>) -> Self {
        Self(value)
    }
}

impl From<&[u32]> for Oid {
    fn from(value: &[u32]) -> Self {
        Self::from_slice(value)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for part in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            first = false;
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OidParseError {
    pub component: String,
}

impl fmt::Display for OidParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid OID component: {}", self.component)
    }
}

impl std::error::Error for OidParseError {}

impl FromStr for Oid {
    type Err = OidParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut parts = Vec::new();
        for part in value.split('.') {
            if part.is_empty() {
                continue;
            }
            let parsed = part.parse::<u32>().map_err(|_| OidParseError {
                component: part.to_string(),
            })?;
            parts.push(parsed);
        }

        if parts.is_empty() {
            return Err(OidParseError {
                component: value.to_string(),
            });
        }

        Ok(Oid(parts))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SnmpValue {
    Null,
    Integer(i64),
    Unsigned32(u32),
    Counter32(u32),
    Counter64(u64),
    Timeticks(u32),
    OctetString(Vec<u8>),
    ObjectIdentifier(Oid),
    IpAddress([u8; 4]),
    Opaque(Vec<u8>),
    Other(String),
}

impl SnmpValue {
    pub fn empty() -> Self {
        SnmpValue::OctetString(Vec::new())
    }

    pub fn text(value: impl Into<String>) -> Self {
        SnmpValue::OctetString(value.into().into_bytes())
    }

    pub fn as_text_lossy(&self) -> Option<String> {
        match self {
            SnmpValue::OctetString(bytes) | SnmpValue::Opaque(bytes) => {
                Some(String::from_utf8_lossy(bytes).to_string())
            }
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        match self {
            SnmpValue::Null => true,
            SnmpValue::Other(tag) => {
                matches!(tag.as_str(), "NoSuchObject" | "NoSuchInstance" | "EndOfMibView")
            }
            _ => false,
        }
    }
}

impl fmt::Display for SnmpValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnmpValue::Null => f.write_str("null"),
            SnmpValue::Integer(value) => write!(f, "{value}"),
            SnmpValue::Unsigned32(value) => write!(f, "{value}"),
            SnmpValue::Counter32(value) => write!(f, "{value}"),
            SnmpValue::Counter64(value) => write!(f, "{value}"),
            SnmpValue::Timeticks(value) => write!(f, "{value} ticks"),
            SnmpValue::OctetString(bytes) | SnmpValue::Opaque(bytes) => {
                f.write_str(&String::from_utf8_lossy(bytes))
            }
            SnmpValue::ObjectIdentifier(oid) => write!(f, "{oid}"),
            SnmpValue::IpAddress(bytes) => {
                write!(f, "{}.{}.{}.{}", bytes[0], bytes[1], bytes[2], bytes[3])
            }
            SnmpValue::Other(value) => f.write_str(value),
        }
    }
}

pub type SnmpFuture<'a> =
    Pin<Box<dyn Future<Output = Result<SnmpResponse, Error>> + Send + 'a>>;

pub trait SnmpClient: Send + Sync {
    fn get<'a>(&'a self, request: SnmpRequest) -> SnmpFuture<'a>;
    fn walk<'a>(&'a self, request: SnmpWalkRequest) -> SnmpFuture<'a>;
    fn set<'a>(&'a self, request: SnmpSetRequest) -> SnmpFuture<'a>;
}

#[derive(Debug, Clone)]
pub struct SnmpV1Client {
    profiles: SnmpProfiles,
}

impl SnmpV1Client {
    pub fn new(profiles: SnmpProfiles) -> Self {
        Self { profiles }
    }

    pub fn profiles(&self) -> &SnmpProfiles {
        &self.profiles
    }

    pub async fn get(&self, request: SnmpRequest) -> Result<SnmpResponse, Error> {
        let SnmpRequest {
            address,
            oids,
            profile,
        } = request;

        let config = self.profiles.config(profile).clone();
        let address_label = address.to_string();
        let oids_label: Vec<String> = oids.iter().map(|oid| oid.to_string()).collect();

        debug!(
            target: targets::SNMP,
            address = %address_label,
            oids = ?oids_label,
            %profile,
            timeout_ms = config.timeout.as_millis(),
            retries = config.retries,
            "SNMP GET"
        );

        match async_get(address, oids, config).await {
            Ok(response) => {
                debug!(
                    target: targets::SNMP,
                    address = %address_label,
                    count = response.varbinds.len(),
                    "SNMP GET ok"
                );
                for varbind in &response.varbinds {
                    trace!(
                        target: targets::SNMP,
                        address = %address_label,
                        oid = %varbind.oid,
                        value = %varbind.value,
                        "SNMP value"
                    );
                }
                Ok(response)
            }
            Err(error) => {
                warn!(
                    target: targets::SNMP,
                    address = %address_label,
                    error = %error.technical_detail(),
                    "SNMP GET failed"
                );
                Err(error)
            }
        }
    }

    pub async fn walk(&self, request: SnmpWalkRequest) -> Result<SnmpResponse, Error> {
        let SnmpWalkRequest {
            address,
            root_oid,
            max_results,
            profile,
        } = request;

        let config = self.profiles.config(profile).clone();
        let address_label = address.to_string();

        debug!(
            target: targets::SNMP,
            address = %address_label,
            root = %root_oid,
            max_results,
            %profile,
            timeout_ms = config.timeout.as_millis(),
            retries = config.retries,
            "SNMP WALK"
        );

        match async_walk(address, root_oid, max_results, config).await {
            Ok(response) => {
                debug!(
                    target: targets::SNMP,
                    address = %address_label,
                    count = response.varbinds.len(),
                    "SNMP WALK ok"
                );
                for varbind in &response.varbinds {
                    trace!(
                        target: targets::SNMP,
                        address = %address_label,
                        oid = %varbind.oid,
                        value = %varbind.value,
                        "SNMP walk value"
                    );
                }
                Ok(response)
            }
            Err(error) => {
                warn!(
                    target: targets::SNMP,
                    address = %address_label,
                    error = %error.technical_detail(),
                    "SNMP WALK failed"
                );
                Err(error)
            }
        }
    }

    pub async fn set(&self, request: SnmpSetRequest) -> Result<SnmpResponse, Error> {
        let SnmpSetRequest {
            address,
            bindings,
            profile,
        } = request;

        let config = self.profiles.config(profile).clone();
        let address_label = address.to_string();

        debug!(
            target: targets::SNMP,
            address = %address_label,
            count = bindings.len(),
            %profile,
            "SNMP SET"
        );

        match async_set(address, bindings, config).await {
            Ok(response) => {
                debug!(target: targets::SNMP, address = %address_label, "SNMP SET ok");
                Ok(response)
            }
            Err(error) => {
                warn!(
                    target: targets::SNMP,
                    address = %address_label,
                    error = %error.technical_detail(),
                    "SNMP SET failed"
                );
                Err(error)
            }
        }
    }
}

impl SnmpClient for SnmpV1Client {
    fn get<'a>(&'a self, request: SnmpRequest) -> SnmpFuture<'a> {
        Box::pin(async move { SnmpV1Client::get(self, request).await })
    }

    fn walk<'a>(&'a self, request: SnmpWalkRequest) -> SnmpFuture<'a> {
        Box::pin(async move { SnmpV1Client::walk(self, request).await })
    }

    fn set<'a>(&'a self, request: SnmpSetRequest) -> SnmpFuture<'a> {
        Box::pin(async move { SnmpV1Client::set(self, request).await })
    }
}

/// In-process stand-in for the network.
///
/// Queued results are served first (FIFO, for any request kind). After that,
/// requests are answered from the per-host agent tables registered with
/// [`MockSnmpClient::add_agent`]; a host without an agent times out, and a
/// Get for an OID the agent does not hold fails the way a v1 agent answers
/// with `noSuchName`.
#[derive(Debug, Clone, Default)]
pub struct MockSnmpClient {
    queue: Arc<Mutex<VecDeque<Result<SnmpResponse, Error>>>>,
    agents: Arc<Mutex<HashMap<String, FlatResult>>>,
    sets: Arc<Mutex<Vec<SnmpSetRequest>>>,
    profiles: Arc<Mutex<Vec<Profile>>>,
}

impl MockSnmpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: SnmpResponse) {
        self.push_result(Ok(response));
    }

    pub fn push_error(&self, error: Error) {
        self.push_result(Err(error));
    }

    pub fn add_agent(&self, host: impl Into<String>, values: impl IntoIterator<Item = (Oid, SnmpValue)>) {
        if let Ok(mut agents) = self.agents.lock() {
            agents.insert(host.into(), values.into_iter().collect());
        }
    }

    pub fn remove_agent(&self, host: &str) {
        if let Ok(mut agents) = self.agents.lock() {
            agents.remove(host);
        }
    }

    pub fn agent_value(&self, host: &str, oid: &Oid) -> Option<SnmpValue> {
        let agents = self.agents.lock().ok()?;
        agents.get(host)?.get(oid).cloned()
    }

    pub fn recorded_sets(&self) -> Vec<SnmpSetRequest> {
        self.sets
            .lock()
            .map(|sets| sets.clone())
            .unwrap_or_default()
    }

    pub fn recorded_profiles(&self) -> Vec<Profile> {
        self.profiles
            .lock()
            .map(|profiles| profiles.clone())
            .unwrap_or_default()
    }

    fn push_result(&self, result: Result<SnmpResponse, Error>) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(result);
        }
    }

    fn pop_result(&self) -> Option<Result<SnmpResponse, Error>> {
        if let Ok(mut queue) = self.queue.lock() {
            return queue.pop_front();
        }
        None
    }

    fn record_profile(&self, profile: Profile) {
        if let Ok(mut profiles) = self.profiles.lock() {
            profiles.push(profile);
        }
    }

    fn with_agent<T>(
        &self,
        address: &SnmpAddress,
        f: impl FnOnce(&mut FlatResult) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut agents = self.agents.lock().map_err(|_| Error::SnmpFailure {
            address: address.to_string(),
            details: "MockSnmpClient agent table poisoned".to_string(),
        })?;
        match agents.get_mut(&address.host) {
            Some(values) => f(values),
            None => Err(Error::SnmpTimeout {
                address: address.to_string(),
                timeout_ms: 0,
            }),
        }
    }

    fn answer_get(&self, request: &SnmpRequest) -> Result<SnmpResponse, Error> {
        self.with_agent(&request.address, |values| {
            let mut varbinds = Vec::with_capacity(request.oids.len());
            for oid in &request.oids {
                let Some(value) = values.get(oid) else {
                    return Err(no_such_name(&request.address, oid));
                };
                varbinds.push(SnmpVarBind::new(oid.clone(), value.clone()));
            }
            Ok(SnmpResponse {
                address: request.address.clone(),
                varbinds,
            })
        })
    }

    fn answer_walk(&self, request: &SnmpWalkRequest) -> Result<SnmpResponse, Error> {
        self.with_agent(&request.address, |values| {
            let limit = if request.max_results == 0 {
                usize::MAX
            } else {
                request.max_results
            };
            let varbinds = values
                .iter()
                .filter(|(oid, _)| oid.is_descendant_of(&request.root_oid))
                .take(limit)
                .map(|(oid, value)| SnmpVarBind::new(oid.clone(), value.clone()))
                .collect();
            Ok(SnmpResponse {
                address: request.address.clone(),
                varbinds,
            })
        })
    }

    fn answer_set(&self, request: &SnmpSetRequest) -> Result<SnmpResponse, Error> {
        self.with_agent(&request.address, |values| {
            if let Some(missing) = request
                .bindings
                .iter()
                .find(|binding| !values.contains_key(&binding.oid))
            {
                return Err(no_such_name(&request.address, &missing.oid));
            }
            for binding in &request.bindings {
                values.insert(binding.oid.clone(), binding.value.clone());
            }
            Ok(SnmpResponse {
                address: request.address.clone(),
                varbinds: request.bindings.clone(),
            })
        })
    }
}

impl SnmpClient for MockSnmpClient {
    fn get<'a>(&'a self, request: SnmpRequest) -> SnmpFuture<'a> {
        Box::pin(async move {
            self.record_profile(request.profile);
            if let Some(result) = self.pop_result() {
                return result;
            }
            self.answer_get(&request)
        })
    }

    fn walk<'a>(&'a self, request: SnmpWalkRequest) -> SnmpFuture<'a> {
        Box::pin(async move {
            self.record_profile(request.profile);
            if let Some(result) = self.pop_result() {
                return result;
            }
            self.answer_walk(&request)
        })
    }

    fn set<'a>(&'a self, request: SnmpSetRequest) -> SnmpFuture<'a> {
        Box::pin(async move {
            self.record_profile(request.profile);
            if let Ok(mut sets) = self.sets.lock() {
                sets.push(request.clone());
            }
            if let Some(result) = self.pop_result() {
                return result;
            }
            self.answer_set(&request)
        })
    }
}

fn no_such_name(address: &SnmpAddress, oid: &Oid) -> Error {
    Error::SnmpFailure {
        address: address.to_string(),
        details: format!("noSuchName for {oid}"),
    }
}

async fn async_get(
    address: SnmpAddress,
    oids: Vec<Oid>,
    config: SnmpConfig,
) -> Result<SnmpResponse, Error> {
    let address_label = address.to_string();
    let mut session = open_session(&address, &config).await?;
    let snmp_oids = to_snmp2_oids(&address, &oids)?;
    let mut varbinds = Vec::new();

    for chunk in snmp_oids.chunks(MAX_OIDS_PER_GET) {
        let oid_refs: Vec<&Snmp2Oid> = chunk.iter().collect();
        varbinds.extend(
            get_many_with_retries(
                &mut session,
                &address,
                &address_label,
                &config,
                oid_refs.as_slice(),
            )
            .await?,
        );
    }

    Ok(SnmpResponse { address, varbinds })
}

async fn async_walk(
    address: SnmpAddress,
    root_oid: Oid,
    max_results: usize,
    config: SnmpConfig,
) -> Result<SnmpResponse, Error> {
    let address_label = address.to_string();
    let mut session = open_session(&address, &config).await?;
    let root_snmp = to_snmp2_oid(&address, &root_oid)?;
    let mut current = root_snmp.clone();
    let mut results = Vec::new();
    let mut remaining = max_results;

    loop {
        if max_results > 0 {
            if remaining == 0 {
                break;
            }
            remaining -= 1;
        }

        let timeout_ms = duration_ms(config.timeout);
        let mut attempts = 0;
        let pdu = loop {
            match timeout(config.timeout, session.getnext(&current)).await {
                Ok(Ok(pdu)) => break pdu,
                Ok(Err(error)) => {
                    if attempts < config.retries {
                        attempts += 1;
                        continue;
                    }
                    return Err(map_snmp2_error(&address, error));
                }
                Err(_) => {
                    if attempts < config.retries {
                        attempts += 1;
                        continue;
                    }
                    return Err(Error::SnmpTimeout {
                        address: address.to_string(),
                        timeout_ms,
                    });
                }
            }
        };

        if pdu.error_status == ERROR_STATUS_NO_SUCH_NAME {
            break;
        }
        if pdu.error_status != 0 {
            return Err(error_status(&address, pdu.error_status, pdu.error_index));
        }

        let mut progressed = false;
        for (oid, value) in pdu.varbinds {
            let mapped_oid = map_snmp2_oid(&address_label, &oid);
            if mapped_oid.is_empty()
                || !mapped_oid.is_descendant_of(&root_oid)
                || oid == current
            {
                return Ok(SnmpResponse {
                    address,
                    varbinds: results,
                });
            }

            results.push(SnmpVarBind {
                oid: mapped_oid,
                value: map_snmp2_value(&address_label, value),
            });
            current = oid.to_owned();
            progressed = true;
        }

        if !progressed {
            break;
        }
    }

    Ok(SnmpResponse {
        address,
        varbinds: results,
    })
}

async fn async_set(
    address: SnmpAddress,
    bindings: Vec<SnmpVarBind>,
    config: SnmpConfig,
) -> Result<SnmpResponse, Error> {
    let mut session = open_session(&address, &config).await?;
    let oids = bindings
        .iter()
        .map(|binding| to_snmp2_oid(&address, &binding.oid))
        .collect::<Result<Vec<_>, _>>()?;
    let mut values = Vec::with_capacity(bindings.len());
    for (oid, binding) in oids.iter().zip(&bindings) {
        values.push((oid, to_snmp2_value(&address, &binding.value)?));
    }

    let timeout_ms = duration_ms(config.timeout);
    let mut attempts = 0;
    loop {
        match timeout(config.timeout, session.set(values.as_slice())).await {
            Ok(Ok(pdu)) => {
                if pdu.error_status != 0 {
                    return Err(error_status(&address, pdu.error_status, pdu.error_index));
                }
                break;
            }
            Ok(Err(error)) => {
                if attempts < config.retries {
                    attempts += 1;
                    continue;
                }
                return Err(map_snmp2_error(&address, error));
            }
            Err(_) => {
                if attempts < config.retries {
                    attempts += 1;
                    continue;
                }
                return Err(Error::SnmpTimeout {
                    address: address.to_string(),
                    timeout_ms,
                });
            }
        }
    }

    Ok(SnmpResponse {
        address,
        varbinds: bindings,
    })
}

async fn open_session(address: &SnmpAddress, config: &SnmpConfig) -> Result<AsyncSession, Error> {
    let timeout_ms = duration_ms(config.timeout);
    let target = format!("{}:{}", address.host, address.port);
    match timeout(
        config.timeout,
        AsyncSession::new_v1(target.as_str(), config.community.as_bytes(), 0),
    )
    .await
    {
        Ok(Ok(session)) => Ok(session),
        Ok(Err(error)) => Err(map_snmp2_io_error(address, timeout_ms, error)),
        Err(_) => Err(Error::SnmpTimeout {
            address: address.to_string(),
            timeout_ms,
        }),
    }
}

async fn get_many_with_retries(
    session: &mut AsyncSession,
    address: &SnmpAddress,
    address_label: &str,
    config: &SnmpConfig,
    oids: &[&Snmp2Oid<'_>],
) -> Result<Vec<SnmpVarBind>, Error> {
    let timeout_ms = duration_ms(config.timeout);
    let mut attempts = 0;
    loop {
        match timeout(config.timeout, session.get_many(oids)).await {
            Ok(Ok(pdu)) => {
                if pdu.error_status != 0 {
                    return Err(error_status(address, pdu.error_status, pdu.error_index));
                }
                return Ok(map_snmp2_varbinds(address_label, pdu));
            }
            Ok(Err(error)) => {
                if attempts < config.retries {
                    attempts += 1;
                    continue;
                }
                return Err(map_snmp2_error(address, error));
            }
            Err(_) => {
                if attempts < config.retries {
                    attempts += 1;
                    continue;
                }
                return Err(Error::SnmpTimeout {
                    address: address.to_string(),
                    timeout_ms,
                });
            }
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    duration.as_millis().min(u128::from(u64::MAX)) as u64
}

fn error_status(address: &SnmpAddress, status: u32, index: u32) -> Error {
    Error::SnmpFailure {
        address: address.to_string(),
        details: format!("error-status {status} at varbind {index}"),
    }
}

fn to_snmp2_oids(address: &SnmpAddress, oids: &[Oid]) -> Result<Vec<Snmp2Oid<'static>>, Error> {
    oids.iter().map(|oid| to_snmp2_oid(address, oid)).collect()
}

fn to_snmp2_oid(address: &SnmpAddress, oid: &Oid) -> Result<Snmp2Oid<'static>, Error> {
    let arcs: Vec<u64> = oid.as_slice().iter().map(|value| u64::from(*value)).collect();
    Snmp2Oid::from(arcs.as_slice()).map_err(|error| Error::SnmpFailure {
        address: address.to_string(),
        details: format!("Invalid OID {oid}: {error:?}"),
    })
}

fn to_snmp2_value<'a>(address: &SnmpAddress, value: &'a SnmpValue) -> Result<Snmp2Value<'a>, Error> {
    match value {
        SnmpValue::OctetString(bytes) => Ok(Snmp2Value::OctetString(bytes)),
        SnmpValue::Integer(value) => Ok(Snmp2Value::Integer(*value)),
        other => Err(Error::SnmpFailure {
            address: address.to_string(),
            details: format!("Unsupported SET value: {other:?}"),
        }),
    }
}

fn map_snmp2_io_error(address: &SnmpAddress, timeout_ms: u64, error: io::Error) -> Error {
    if error.kind() == io::ErrorKind::TimedOut {
        Error::SnmpTimeout {
            address: address.to_string(),
            timeout_ms,
        }
    } else {
        Error::SnmpFailure {
            address: address.to_string(),
            details: error.to_string(),
        }
    }
}

fn map_snmp2_error(address: &SnmpAddress, error: Snmp2Error) -> Error {
    match error {
        Snmp2Error::CommunityMismatch => Error::SnmpAuth {
            address: address.to_string(),
            details: Some(format!("{error}")),
        },
        other => Error::SnmpFailure {
            address: address.to_string(),
            details: other.to_string(),
        },
    }
}

fn map_snmp2_oid(address: &str, oid: &Snmp2Oid<'_>) -> Oid {
    let Some(iter) = oid.iter() else {
        warn!(
            target: targets::SNMP,
            address = %address,
            "Failed to parse SNMP OID"
        );
        return Oid(Vec::new());
    };

    let mut arcs = Vec::new();
    for arc in iter {
        match u32::try_from(arc) {
            Ok(value) => arcs.push(value),
            Err(_) => {
                warn!(
                    target: targets::SNMP,
                    address = %address,
                    arc = arc,
                    "SNMP OID component out of range"
                );
                return Oid(Vec::new());
            }
        }
    }

    Oid(arcs)
}

fn map_snmp2_value(address: &str, value: Snmp2Value<'_>) -> SnmpValue {
    match value {
        Snmp2Value::Null => SnmpValue::Null,
        Snmp2Value::Integer(value) => SnmpValue::Integer(value),
        Snmp2Value::OctetString(value) => SnmpValue::OctetString(value.to_vec()),
        Snmp2Value::ObjectIdentifier(value) => {
            SnmpValue::ObjectIdentifier(map_snmp2_oid(address, &value))
        }
        Snmp2Value::IpAddress(value) => SnmpValue::IpAddress(value),
        Snmp2Value::Counter32(value) => SnmpValue::Counter32(value),
        Snmp2Value::Unsigned32(value) => SnmpValue::Unsigned32(value),
        Snmp2Value::Timeticks(value) => SnmpValue::Timeticks(value),
        Snmp2Value::Counter64(value) => SnmpValue::Counter64(value),
        Snmp2Value::Opaque(value) => SnmpValue::Opaque(value.to_vec()),
        Snmp2Value::EndOfMibView => SnmpValue::Other("EndOfMibView".to_string()),
        Snmp2Value::NoSuchObject => SnmpValue::Other("NoSuchObject".to_string()),
        Snmp2Value::NoSuchInstance => SnmpValue::Other("NoSuchInstance".to_string()),
        Snmp2Value::Sequence(_) => SnmpValue::Other("Sequence".to_string()),
        Snmp2Value::Set(_) => SnmpValue::Other("Set".to_string()),
        Snmp2Value::Constructed(tag, _) => {
            SnmpValue::Other(format!("Constructed({tag})"))
        }
        Snmp2Value::GetRequest(_) => SnmpValue::Other("GetRequest".to_string()),
        Snmp2Value::GetNextRequest(_) => SnmpValue::Other("GetNextRequest".to_string()),
        Snmp2Value::GetBulkRequest(_) => SnmpValue::Other("GetBulkRequest".to_string()),
        Snmp2Value::Response(_) => SnmpValue::Other("Response".to_string()),
        Snmp2Value::SetRequest(_) => SnmpValue::Other("SetRequest".to_string()),
        Snmp2Value::InformRequest(_) => SnmpValue::Other("InformRequest".to_string()),
        Snmp2Value::Trap(_) => SnmpValue::Other("Trap".to_string()),
        Snmp2Value::Report(_) => SnmpValue::Other("Report".to_string()),
        Snmp2Value::Boolean(value) => SnmpValue::Other(format!("Boolean({value})")),
    }
}

fn map_snmp2_varbinds(address: &str, pdu: snmp2::Pdu<'_>) -> Vec<SnmpVarBind> {
    pdu.varbinds
        .map(|(oid, value)| SnmpVarBind {
            oid: map_snmp2_oid(address, &oid),
            value: map_snmp2_value(address, value),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(value: &str) -> Oid {
        value.parse().expect("oid")
    }

    fn run_future<T>(future: impl std::future::Future<Output = T>) -> T {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("tokio runtime");
        runtime.block_on(future)
    }

    #[test]
    fn oid_parses_and_formats() {
        let parsed = oid("1.3.6.1.2.1.1.1.0");
        assert_eq!(parsed.to_string(), "1.3.6.1.2.1.1.1.0");
        assert_eq!(parsed.as_slice(), &[1, 3, 6, 1, 2, 1, 1, 1, 0]);
    }

    #[test]
    fn oid_descendant_excludes_itself_and_siblings() {
        let root = oid("1.3.6.1.2.1.43.11.1.1");
        assert!(oid("1.3.6.1.2.1.43.11.1.1.9.1.2").is_descendant_of(&root));
        assert!(!root.is_descendant_of(&root));
        assert!(!oid("1.3.6.1.2.1.43.11.1.2.1").is_descendant_of(&root));
        assert_eq!(oid("1.3.6.1.2.1.43.11.1.1.9.1.2").tail(2), &[1, 2]);
    }

    #[test]
    fn mock_snmp_returns_queued_response() {
        let mock = MockSnmpClient::new();
        let address = SnmpAddress::with_default_port("192.168.1.10");
        let uptime = oid("1.3.6.1.2.1.1.3.0");

        mock.push_response(SnmpResponse {
            address: address.clone(),
            varbinds: vec![SnmpVarBind::new(uptime.clone(), SnmpValue::Counter32(123))],
        });

        let request = SnmpRequest::new(address, vec![uptime]);
        let response = run_future(mock.get(request)).expect("mock response");
        assert_eq!(response.varbinds.len(), 1);
        assert_eq!(response.varbinds[0].value, SnmpValue::Counter32(123));
    }

    #[test]
    fn mock_snmp_without_agent_times_out() {
        let mock = MockSnmpClient::new();
        let address = SnmpAddress::with_default_port("192.168.1.10");
        let request = SnmpRequest::new(address.clone(), vec![oid("1.3.6.1.2.1.1.3.0")])
            .with_profile(Profile::Discovery);

        let error = run_future(mock.get(request)).expect_err("expected error");
        match error {
            Error::SnmpTimeout {
                address: error_address,
                ..
            } => {
                assert_eq!(error_address, address.to_string());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(mock.recorded_profiles(), vec![Profile::Discovery]);
    }

    #[test]
    fn mock_agent_walk_returns_only_the_subtree() {
        let mock = MockSnmpClient::new();
        mock.add_agent(
            "10.0.0.2",
            [
                (oid("1.3.6.1.2.1.43.6.1.1.2.1.1"), SnmpValue::text("Front door")),
                (oid("1.3.6.1.2.1.43.6.1.1.3.1.1"), SnmpValue::Integer(4)),
                (oid("1.3.6.1.2.1.43.8.2.1.2.1.1"), SnmpValue::Integer(3)),
            ],
        );

        let request = SnmpWalkRequest::new(
            SnmpAddress::with_default_port("10.0.0.2"),
            oid("1.3.6.1.2.1.43.6.1.1"),
        );
        let flat = run_future(mock.walk(request)).expect("walk").into_flat();
        assert_eq!(flat.len(), 2);
        assert!(flat.contains_key(&oid("1.3.6.1.2.1.43.6.1.1.3.1.1")));
    }

    #[test]
    fn mock_agent_get_of_unknown_oid_fails() {
        let mock = MockSnmpClient::new();
        mock.add_agent("10.0.0.3", [(oid("1.3.6.1.2.1.1.5.0"), SnmpValue::text("lab"))]);
        let request = SnmpRequest::new(
            SnmpAddress::with_default_port("10.0.0.3"),
            vec![oid("1.3.6.1.2.1.1.5.0"), oid("1.3.6.1.2.1.1.6.0")],
        );
        let error = run_future(mock.get(request)).expect_err("noSuchName");
        assert!(matches!(error, Error::SnmpFailure { .. }));
    }

    #[test]
    fn mock_agent_applies_sets() {
        let mock = MockSnmpClient::new();
        let name = oid("1.3.6.1.2.1.1.5.0");
        mock.add_agent("10.0.0.4", [(name.clone(), SnmpValue::text("old"))]);

        let request = SnmpSetRequest::new(
            SnmpAddress::with_default_port("10.0.0.4"),
            vec![SnmpVarBind::new(name.clone(), SnmpValue::text("new"))],
        );
        run_future(mock.set(request)).expect("set");

        assert_eq!(mock.agent_value("10.0.0.4", &name), Some(SnmpValue::text("new")));
        assert_eq!(mock.recorded_sets().len(), 1);
    }

    #[test]
    fn missing_placeholders_are_detected() {
        assert!(SnmpValue::Null.is_missing());
        assert!(SnmpValue::Other("NoSuchInstance".to_string()).is_missing());
        assert!(!SnmpValue::empty().is_missing());
    }
}
