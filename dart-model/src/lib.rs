//! Abstract document model for generated Dart store wrappers.
//!
//! This crate defines data structures that represent the emitted Dart text
//! in an abstract way, separate from the descriptor walking that produces it.
//! Every item renders through [`std::fmt::Display`].
//!
//! ```rust
//! use dart_model::{DartType, Scalar};
//!
//! let tags = DartType::list(DartType::Scalar(Scalar::String));
//! assert_eq!(tags.to_string(), "Iterable<String>");
//! assert_eq!(tags.element(), Some(DartType::Scalar(Scalar::String)));
//! ```

use std::fmt;

/// Error type every generated operation catches and publishes.
pub const ERROR_TYPE: &str = "GrpcError";

/// Dart expression hashed into a per-call [`ReferenceKey`].
pub const REQUEST_HASH: &str = "${req.hashCode}";

/// Token that regeneration tooling scans for.
pub const INSERTION_TOKEN: &str = "@@protoc_insertion_point";

/// Wrapper members and operation locals a parameter must not shadow.
pub const RESERVED_BINDINGS: [&str; 8] = [
    "api",
    "store",
    "req",
    "res",
    "err",
    "baseRef",
    "loadingRef",
    "errorRef",
];

/// Represents a complete generated Dart file
#[derive(Debug, Clone, PartialEq)]
pub struct DartFile {
    pub imports: Vec<Import>,
    pub insertion: InsertionPoint,
    pub blocs: Vec<Bloc>,
}

/// A single `import '...';` directive
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Import {
    pub uri: String,
}

/// Lifecycle phase an insertion point is anchored to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Imports,
    OnStart,
    OnSuccess,
    OnError,
    OnEnd,
}

/// A stable marker where hand-written code survives regeneration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionPoint {
    pub phase: Phase,
    pub scope: String,
}

/// One generated wrapper type per service
#[derive(Debug, Clone, PartialEq)]
pub struct Bloc {
    pub name: String,
    pub client: String,
    pub operations: Vec<Operation>,
}

/// One asynchronous operation per unary method
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub name: String,
    /// Fully-qualified method name, used to anchor insertion points.
    pub scope: String,
    pub request: String,
    pub response: String,
    pub params: Vec<Param>,
}

/// A named parameter of an [`Operation`]
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: DartType,
    pub required: bool,
}

/// Scalar Dart types, including references to generated message and enum classes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scalar {
    Double,
    Int64,
    Int,
    Bool,
    String,
    Bytes,

    // Generated message or enum class (referenced by name)
    Named(String),
}

/// Represents Dart types used in generated signatures.
///
/// `Nullable` only ever wraps a [`Scalar`], so a nullable collection cannot
/// be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DartType {
    Scalar(Scalar),
    Nullable(Scalar),
    List(Box<DartType>),
    Map {
        key: Box<DartType>,
        element: Box<DartType>,
    },
}

/// Store key addressing the slots of one call instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceKey {
    base: String,
}

/// A single write into the store, in the order an operation performs them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreWrite {
    Loading(bool),
    ClearError,
    Result(String),
    Error,
    Notify,
}

impl DartType {
    /// Creates a list type
    pub fn list(element: DartType) -> Self {
        DartType::List(Box::new(element))
    }

    /// Creates a map type
    pub fn map(key: DartType, element: DartType) -> Self {
        DartType::Map {
            key: Box::new(key),
            element: Box::new(element),
        }
    }

    /// Element type of a list or map; `None` for everything else.
    pub fn element(&self) -> Option<DartType> {
        match self {
            DartType::List(element) | DartType::Map { element, .. } => Some((**element).clone()),
            DartType::Scalar(_) | DartType::Nullable(_) => None,
        }
    }

    /// Key type of a map. Lists are keyed by `int`.
    pub fn key(&self) -> Option<DartType> {
        match self {
            DartType::Map { key, .. } => Some((**key).clone()),
            DartType::List(_) => Some(DartType::Scalar(Scalar::Int)),
            DartType::Scalar(_) | DartType::Nullable(_) => None,
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, DartType::Nullable(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, DartType::List(_) | DartType::Map { .. })
    }

    /// Converts to the nullable type. Lists and maps are returned unmodified.
    pub fn nullable(self) -> Self {
        match self {
            DartType::Scalar(s) => DartType::Nullable(s),
            other => other,
        }
    }

    /// Strips the nullable wrapper, if any.
    pub fn non_nullable(self) -> Self {
        match self {
            DartType::Nullable(s) => DartType::Scalar(s),
            other => other,
        }
    }

    /// Default literal for an omitted collection argument
    pub fn empty_literal(&self) -> Option<&'static str> {
        match self {
            DartType::List(_) => Some("const []"),
            DartType::Map { .. } => Some("const {}"),
            DartType::Scalar(_) | DartType::Nullable(_) => None,
        }
    }
}

impl ReferenceKey {
    pub const LOADING_SUFFIX: &'static str = ":loading";
    pub const ERROR_SUFFIX: &'static str = ":error";

    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    /// Key of one invocation: `<method>(<hash>)`
    pub fn for_call(method: &str, hash: impl fmt::Display) -> Self {
        Self::new(format!("{method}({hash})"))
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn loading(&self) -> String {
        format!("{}{}", self.base, Self::LOADING_SUFFIX)
    }

    pub fn error(&self) -> String {
        format!("{}{}", self.base, Self::ERROR_SUFFIX)
    }
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Imports => "imports",
            Phase::OnStart => "on_start",
            Phase::OnSuccess => "on_success",
            Phase::OnError => "on_error",
            Phase::OnEnd => "on_end",
        }
    }
}

impl InsertionPoint {
    pub fn new(phase: Phase, scope: impl Into<String>) -> Self {
        Self {
            phase,
            scope: scope.into(),
        }
    }
}

impl Import {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

impl DartFile {
    /// Creates an empty file whose import marker is anchored at `scope`
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            imports: Vec::new(),
            insertion: InsertionPoint::new(Phase::Imports, scope),
            blocs: Vec::new(),
        }
    }

    pub fn add_import(&mut self, import: Import) {
        self.imports.push(import);
    }

    pub fn add_bloc(&mut self, bloc: Bloc) {
        self.blocs.push(bloc);
    }
}

impl Bloc {
    pub fn new(name: String, client: String) -> Self {
        Self {
            name,
            client,
            operations: Vec::new(),
        }
    }

    pub fn add_operation(&mut self, operation: Operation) {
        self.operations.push(operation);
    }
}

impl Param {
    /// Name the parameter is declared under. Reserved names get a trailing
    /// underscore; the request field keeps `name`.
    pub fn binding(&self) -> String {
        if RESERVED_BINDINGS.contains(&self.name.as_str()) {
            format!("{}_", self.name)
        } else {
            self.name.clone()
        }
    }
}

impl Operation {
    /// Store writes in emission order. The success and error writes are
    /// mutually exclusive at runtime; every other write always happens.
    pub fn store_writes(&self) -> [StoreWrite; 7] {
        [
            StoreWrite::Loading(true),
            StoreWrite::ClearError,
            StoreWrite::Notify,
            StoreWrite::Result(self.response.clone()),
            StoreWrite::Error,
            StoreWrite::Loading(false),
            StoreWrite::Notify,
        ]
    }

    fn marker(&self, phase: Phase) -> InsertionPoint {
        InsertionPoint::new(phase, self.scope.as_str())
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Double => f.write_str("double"),
            Scalar::Int64 => f.write_str("Int64"),
            Scalar::Int => f.write_str("int"),
            Scalar::Bool => f.write_str("bool"),
            Scalar::String => f.write_str("String"),
            Scalar::Bytes => f.write_str("List<int>"),
            Scalar::Named(name) => f.write_str(name),
        }
    }
}

impl fmt::Display for DartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DartType::Scalar(s) => write!(f, "{s}"),
            DartType::Nullable(s) => write!(f, "{s}?"),
            DartType::List(element) => write!(f, "Iterable<{element}>"),
            DartType::Map { key, element } => write!(f, "Map<{key}, {element}>"),
        }
    }
}

impl fmt::Display for ReferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)
    }
}

impl fmt::Display for InsertionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "// {}({}:{})", INSERTION_TOKEN, self.phase.as_str(), self.scope)
    }
}

impl fmt::Display for Import {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "import '{}';", self.uri)
    }
}

impl fmt::Display for StoreWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreWrite::Loading(value) => write!(f, "store.publishRecord(loadingRef, {value});"),
            StoreWrite::ClearError => {
                write!(f, "store.publishRecord<{ERROR_TYPE}?>(errorRef, null);")
            }
            StoreWrite::Result(response) => {
                write!(f, "store.publishRecord<{response}>(baseRef, res);")
            }
            StoreWrite::Error => write!(f, "store.publishRecord<{ERROR_TYPE}>(errorRef, err);"),
            StoreWrite::Notify => f.write_str("store.notify();"),
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.required {
            return write!(f, "required {} {},", self.ty.clone().non_nullable(), self.binding());
        }

        match self.ty.empty_literal() {
            Some(empty) => write!(f, "{} {} = {},", self.ty, self.binding(), empty),
            None => write!(f, "{} {},", self.ty.clone().nullable(), self.binding()),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [
            start_loading,
            clear_error,
            notify_start,
            publish_result,
            publish_error,
            end_loading,
            notify_end,
        ] = self.store_writes();

        // Signature
        writeln!(f, "  Future<Result<{}>> {}({{", self.response, self.name)?;
        for param in &self.params {
            writeln!(f, "    {param}")?;
        }
        writeln!(f, "  }}) async {{")?;

        // Request
        writeln!(f, "    final req = {}(", self.request)?;
        for param in &self.params {
            writeln!(f, "      {}: {},", param.name, param.binding())?;
        }
        writeln!(f, "    );")?;

        // Refs
        let call = ReferenceKey::for_call(&self.name, REQUEST_HASH);
        let base = ReferenceKey::new("$baseRef");
        writeln!(f, "    final baseRef = '{call}';")?;
        writeln!(f, "    final loadingRef = '{}';", base.loading())?;
        writeln!(f, "    final errorRef = '{}';", base.error())?;
        writeln!(f)?;
        writeln!(f, "    {}", self.marker(Phase::OnStart))?;
        writeln!(f)?;

        writeln!(f, "    {start_loading}")?;
        writeln!(f, "    {clear_error}")?;
        writeln!(f, "    {notify_start}")?;

        // Call
        writeln!(f, "    try {{")?;
        writeln!(f, "      final res = await api.{}(req);", self.name)?;
        writeln!(f, "      {publish_result}")?;
        writeln!(f)?;
        writeln!(f, "      {}", self.marker(Phase::OnSuccess))?;
        writeln!(f)?;
        writeln!(f, "      return Result(res, null);")?;
        writeln!(f, "    }} on {ERROR_TYPE} catch (err) {{")?;
        writeln!(f, "      {publish_error}")?;
        writeln!(f)?;
        writeln!(f, "      {}", self.marker(Phase::OnError))?;
        writeln!(f)?;
        writeln!(f, "      return Result(null, err);")?;
        writeln!(f, "    }} finally {{")?;
        writeln!(f, "      {}", self.marker(Phase::OnEnd))?;
        writeln!(f)?;
        writeln!(f, "      {end_loading}")?;
        writeln!(f, "      {notify_end}")?;
        writeln!(f, "    }}")?;
        writeln!(f, "  }}")
    }
}

impl fmt::Display for Bloc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "class {} {{", self.name)?;
        writeln!(f, "  final {} api;", self.client)?;
        writeln!(f, "  final Store store;")?;
        writeln!(f, "  {}(this.store, this.api);", self.name)?;

        for operation in &self.operations {
            writeln!(f)?;
            write!(f, "{operation}")?;
        }

        writeln!(f, "}}")
    }
}

impl fmt::Display for DartFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for import in &self.imports {
            writeln!(f, "{import}")?;
        }
        writeln!(f)?;
        writeln!(f, "{}", self.insertion)?;

        for bloc in &self.blocs {
            writeln!(f)?;
            write!(f, "{bloc}")?;
        }

        Ok(())
    }
}
