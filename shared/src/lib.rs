pub mod models;

pub use models::{
    CleanReport, ContainerInfo, ContainerStatus, PortBlockOutcome, PortMapping, StackSnapshot,
};
