use serde::{Deserialize, Serialize};

/// A supported Forza edition: its display id, the executable names it is
/// known under (storefronts ship different binaries), and the URI handed to
/// the launch handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditionDescriptor {
    pub id: String,
    /// Stored lowercase; probe matching is case-insensitive.
    pub process_names: Vec<String>,
    pub launch_token: String,
}

impl EditionDescriptor {
    pub fn new(
        id: impl Into<String>,
        process_names: impl IntoIterator<Item = impl Into<String>>,
        launch_token: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            process_names: process_names
                .into_iter()
                .map(|n| n.into().to_lowercase())
                .collect(),
            launch_token: launch_token.into(),
        }
    }

    /// Whether `process_name` is one of this edition's known executables.
    pub fn matches_process(&self, process_name: &str) -> bool {
        let name = process_name.to_lowercase();
        self.process_names.iter().any(|known| *known == name)
    }
}

/// Immutable table of supported editions, built once at startup and passed
/// by reference into the controller.
#[derive(Debug, Clone)]
pub struct EditionRegistry {
    editions: Vec<EditionDescriptor>,
}

impl EditionRegistry {
    pub fn new(editions: Vec<EditionDescriptor>) -> Self {
        Self { editions }
    }

    /// The compiled-in edition table.
    pub fn builtin() -> Self {
        Self::new(vec![
            EditionDescriptor::new(
                "Forza Horizon 4",
                ["forzahorizon4.exe", "forza horizon 4.exe"],
                "steam://rungameid/1293830",
            ),
            EditionDescriptor::new(
                "Forza Horizon 5",
                ["forzahorizon5.exe", "forza horizon 5.exe"],
                "steam://rungameid/1551360",
            ),
            EditionDescriptor::new(
                "Forza Motorsport",
                ["forzamotorsport.exe", "forza motorsport.exe"],
                "steam://rungameid/2440510",
            ),
        ])
    }

    pub fn lookup(&self, id: &str) -> Option<&EditionDescriptor> {
        self.editions.iter().find(|e| e.id == id)
    }

    /// Edition ids in registration order, for selector population.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.editions.iter().map(|e| e.id.as_str())
    }
}
