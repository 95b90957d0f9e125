use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    config::{ConfigError, RoundConfig, WorkerContext},
    identifier::{AssetId, identifier_for},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Create,
    Read,
    Delete,
    /// Domain-specific operation with no per-item identifier.
    Submit,
}

impl RequestKind {
    /// Read and delete always target exactly one identifier.
    #[must_use]
    pub const fn has_fixed_arguments(self) -> bool {
        matches!(self, Self::Read | Self::Delete)
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Delete => "delete",
            Self::Submit => "submit",
        })
    }
}

/// One contract invocation, handed by value to the submission adapter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationRequest {
    contract_id: String,
    #[serde(rename = "contractFunction")]
    function_name: String,
    invoker_identity: String,
    #[serde(rename = "contractArguments")]
    arguments: Vec<String>,
    read_only: bool,
}

impl InvocationRequest {
    #[must_use]
    pub fn contract_id(&self) -> &str {
        &self.contract_id
    }

    #[must_use]
    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    #[must_use]
    pub fn invoker_identity(&self) -> &str {
        &self.invoker_identity
    }

    #[must_use]
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    #[must_use]
    pub const fn read_only(&self) -> bool {
        self.read_only
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Placeholder {
    Id,
    Worker,
    Item,
    Round,
    TotalWorkers,
    Extra(String),
}

impl Placeholder {
    fn from_key(key: &str) -> Self {
        match key {
            "id" => Self::Id,
            "worker" => Self::Worker,
            "item" => Self::Item,
            "round" => Self::Round,
            "total_workers" => Self::TotalWorkers,
            other => Self::Extra(other.to_owned()),
        }
    }

    const fn needs_item(&self) -> bool {
        matches!(self, Self::Id | Self::Item)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// A single contract argument: literal text with optional `{key}`
/// placeholders. `{{` and `}}` stand for literal braces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArgumentTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl ArgumentTemplate {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let malformed = |reason| ConfigError::MalformedTemplate {
            template: raw.to_owned(),
            reason,
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = raw.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut key = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') => return Err(malformed("nested '{'")),
                            Some(c) => key.push(c),
                            None => return Err(malformed("unterminated placeholder")),
                        }
                    }
                    let key = key.trim();
                    if key.is_empty() {
                        return Err(malformed("empty placeholder"));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(Placeholder::from_key(key)));
                }
                '}' => return Err(malformed("unmatched '}'")),
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            raw: raw.to_owned(),
            segments,
        })
    }

    /// Template consisting of the asset identifier only.
    #[must_use]
    pub fn asset_id() -> Self {
        Self {
            raw: "{id}".to_owned(),
            segments: vec![Segment::Placeholder(Placeholder::Id)],
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Keys of the placeholders resolved from the round's extra arguments.
    pub fn extra_keys(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(Placeholder::Extra(key)) => Some(key.as_str()),
            _ => None,
        })
    }

    fn is_asset_id(&self) -> bool {
        matches!(self.segments.as_slice(), [Segment::Placeholder(Placeholder::Id)])
    }

    fn needs_item(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Placeholder(p) if p.needs_item()))
    }

    fn render(&self, scope: &RenderScope<'_>) -> Result<String, ConfigError> {
        let mut out = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(placeholder) => scope.resolve(placeholder, &mut out)?,
            }
        }
        Ok(out)
    }
}

impl TryFrom<String> for ArgumentTemplate {
    type Error = ConfigError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<ArgumentTemplate> for String {
    fn from(template: ArgumentTemplate) -> Self {
        template.raw
    }
}

struct RenderScope<'a> {
    config: &'a RoundConfig,
    worker: &'a WorkerContext,
    item: Option<(u64, &'a AssetId)>,
}

impl RenderScope<'_> {
    fn resolve(&self, placeholder: &Placeholder, out: &mut String) -> Result<(), ConfigError> {
        use fmt::Write as _;

        let item = || {
            self.item.ok_or_else(|| ConfigError::MalformedTemplate {
                template: "{id}".to_owned(),
                reason: "no item identifier in this request",
            })
        };

        // Writing into a String cannot fail.
        let _ = match placeholder {
            Placeholder::Id => write!(out, "{}", item()?.1),
            Placeholder::Item => write!(out, "{}", item()?.0),
            Placeholder::Worker => write!(out, "{}", self.worker.worker_index),
            Placeholder::Round => write!(out, "{}", self.worker.round_index),
            Placeholder::TotalWorkers => write!(out, "{}", self.worker.total_workers),
            Placeholder::Extra(key) => {
                let value =
                    self.config
                        .extra_args
                        .get(key)
                        .ok_or_else(|| ConfigError::UnknownPlaceholder {
                            key: key.clone(),
                        })?;
                out.push_str(value);
                Ok(())
            }
        };
        Ok(())
    }
}

/// Contract function and ordered argument list for one request kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationTemplate {
    pub function: String,
    #[serde(default)]
    pub args: Vec<ArgumentTemplate>,
    /// Only consulted for submit operations; the other kinds have a fixed
    /// read-only flag.
    #[serde(default)]
    pub read_only: bool,
}

impl OperationTemplate {
    #[must_use]
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            args: Vec::new(),
            read_only: false,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args = args
            .into_iter()
            .map(|arg| ArgumentTemplate::parse(arg.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(self)
    }

    #[must_use]
    pub const fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }
}

/// Operations a workload issues, one per request kind.
///
/// Kinds missing from a config file fall back to the generic asset
/// operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationSet {
    pub create: OperationTemplate,
    pub read: OperationTemplate,
    pub delete: OperationTemplate,
    pub submit: Option<OperationTemplate>,
}

impl Default for OperationSet {
    fn default() -> Self {
        Self {
            create: OperationTemplate {
                function: "CreateAsset".to_owned(),
                args: vec![ArgumentTemplate::asset_id()],
                read_only: false,
            },
            read: OperationTemplate::new("ReadAsset"),
            delete: OperationTemplate::new("DeleteAsset"),
            submit: None,
        }
    }
}

impl OperationSet {
    #[must_use]
    pub fn template(&self, kind: RequestKind) -> Option<&OperationTemplate> {
        match kind {
            RequestKind::Create => Some(&self.create),
            RequestKind::Read => Some(&self.read),
            RequestKind::Delete => Some(&self.delete),
            RequestKind::Submit => self.submit.as_ref(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for kind in [RequestKind::Read, RequestKind::Delete] {
            let args = self.template(kind).map_or(&[][..], |t| t.args.as_slice());
            let fixed = args.is_empty() || matches!(args, [only] if only.is_asset_id());
            if !fixed {
                return Err(ConfigError::FixedArguments { kind });
            }
        }
        if let Some(submit) = &self.submit {
            if let Some(arg) = submit.args.iter().find(|arg| arg.needs_item()) {
                return Err(ConfigError::MalformedTemplate {
                    template: arg.as_str().to_owned(),
                    reason: "submit operations have no item identifier",
                });
            }
        }
        Ok(())
    }
}

/// Builds invocation requests for one worker of a round.
///
/// Building is pure: the same inputs always give the same request, and the
/// only randomness (the item picked by [`RequestBuilder::build_random_read`])
/// comes from the generator the caller passes in.
#[derive(Clone, Copy, Debug)]
pub struct RequestBuilder<'a> {
    config: &'a RoundConfig,
    worker: WorkerContext,
}

impl<'a> RequestBuilder<'a> {
    #[must_use]
    pub const fn new(config: &'a RoundConfig, worker: WorkerContext) -> Self {
        Self { config, worker }
    }

    /// Builds the request of `kind` for `item_index`.
    ///
    /// `item_index` must lie in `0..asset_count`; it is ignored for
    /// [`RequestKind::Submit`].
    pub fn build(
        &self,
        kind: RequestKind,
        item_index: u64,
    ) -> Result<InvocationRequest, ConfigError> {
        if kind == RequestKind::Submit {
            return self.build_submission();
        }

        let asset_count = self.config.asset_count;
        if kind == RequestKind::Read && asset_count == 0 {
            return Err(ConfigError::NoAssets { kind });
        }
        if item_index >= asset_count {
            return Err(ConfigError::ItemOutOfRange {
                item: item_index,
                asset_count,
            });
        }

        let template = self
            .config
            .operations
            .template(kind)
            .ok_or(ConfigError::MissingOperation { kind })?;
        let asset_id = identifier_for(self.worker.worker_index, item_index);

        let arguments: Vec<String> = if kind.has_fixed_arguments() {
            vec![asset_id.into()]
        } else {
            let scope = RenderScope {
                config: self.config,
                worker: &self.worker,
                item: Some((item_index, &asset_id)),
            };
            template
                .args
                .iter()
                .map(|arg| arg.render(&scope))
                .collect::<Result<_, _>>()?
        };

        Ok(self.request(template, arguments, kind == RequestKind::Read))
    }

    /// Builds a read of an item drawn uniformly from `0..asset_count`.
    pub fn build_random_read<R>(&self, rng: &mut R) -> Result<InvocationRequest, ConfigError>
    where
        R: Rng + ?Sized,
    {
        if self.config.asset_count == 0 {
            return Err(ConfigError::NoAssets {
                kind: RequestKind::Read,
            });
        }
        let item_index = rng.gen_range(0..self.config.asset_count);
        self.build(RequestKind::Read, item_index)
    }

    pub fn build_submission(&self) -> Result<InvocationRequest, ConfigError> {
        let template =
            self.config
                .operations
                .submit
                .as_ref()
                .ok_or(ConfigError::MissingOperation {
                    kind: RequestKind::Submit,
                })?;
        let scope = RenderScope {
            config: self.config,
            worker: &self.worker,
            item: None,
        };
        let arguments = template
            .args
            .iter()
            .map(|arg| arg.render(&scope))
            .collect::<Result<_, _>>()?;

        Ok(self.request(template, arguments, template.read_only))
    }

    fn request(
        &self,
        template: &OperationTemplate,
        arguments: Vec<String>,
        read_only: bool,
    ) -> InvocationRequest {
        InvocationRequest {
            contract_id: self.config.contract_id.clone(),
            function_name: template.function.clone(),
            invoker_identity: self.config.invoker_identity.clone(),
            arguments,
            read_only,
        }
    }
}
