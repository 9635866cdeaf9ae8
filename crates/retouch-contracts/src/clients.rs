use crate::errors::EditorResult;
use crate::image_data::ImageData;
use crate::request::GenerationRequest;

/// A backend that turns one request into one image.
pub trait GenerationClient: Send + Sync {
    fn name(&self) -> &str;

    fn generate(&self, request: &GenerationRequest) -> EditorResult<ImageData>;
}

/// Clients by name, in registration order.
#[derive(Default)]
pub struct ClientRegistry {
    clients: Vec<Box<dyn GenerationClient>>,
}

impl ClientRegistry {
    pub fn new(clients: Vec<Box<dyn GenerationClient>>) -> Self {
        let mut registry = Self::default();
        for client in clients {
            registry.register(client);
        }
        registry
    }

    /// Adds `client`, replacing any registered under the same name.
    pub fn register(&mut self, client: Box<dyn GenerationClient>) {
        self.clients.retain(|existing| existing.name() != client.name());
        self.clients.push(client);
    }

    /// Removes and returns the client registered as `name`.
    pub fn take(&mut self, name: &str) -> Option<Box<dyn GenerationClient>> {
        let index = self.clients.iter().position(|client| client.name() == name)?;
        Some(self.clients.remove(index))
    }

    pub fn list(&self) -> Vec<String> {
        let mut names = self
            .clients
            .iter()
            .map(|client| client.name().to_string())
            .collect::<Vec<String>>();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl std::fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("clients", &self.list())
            .finish()
    }
}
