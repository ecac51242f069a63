mod temp_workspace_provider;

pub use temp_workspace_provider::TempWorkspaceProvider;
