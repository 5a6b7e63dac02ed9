//! Code generation options

/// Options controlling generated source
#[derive(Debug, Clone)]
pub struct CodegenOptions {
    /// Wrap the output in `pub mod <name> { ... }`
    pub module_name: Option<String>,
    /// Path the generated code imports the runtime from
    pub runtime_crate: String,
    /// Precede each statement with the cell it computes and its formula
    pub emit_comments: bool,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            module_name: None,
            runtime_crate: "sheetc_runtime".to_string(),
            emit_comments: true,
        }
    }
}

impl CodegenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the output in a module
    pub fn with_module(mut self, name: impl Into<String>) -> Self {
        self.module_name = Some(name.into());
        self
    }

    /// Import the runtime from a different path
    pub fn with_runtime_crate(mut self, path: impl Into<String>) -> Self {
        self.runtime_crate = path.into();
        self
    }

    pub fn with_comments(mut self, enabled: bool) -> Self {
        self.emit_comments = enabled;
        self
    }
}
