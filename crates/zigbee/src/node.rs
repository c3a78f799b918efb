//! Diagnostic node trees, printed when a device joins the hub
//!
//! The layout mirrors the interview log of the mesh runtime so the trees
//! stay comparable with what the pairing tools print.

use crate::report::ClusterId;
use tracing::debug;

/// Static description of a zigbee node as learned during pairing
#[derive(Debug, Clone)]
pub struct NodeDescriptor {
    /// the modelId reported on genBasic
    pub model: &'static str,
    /// whether the node reports battery state
    pub battery: bool,
    /// the node's endpoints
    pub endpoints: &'static [Endpoint],
}

/// One endpoint of a node with the clusters it serves
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// endpoint identifier
    pub id: u8,
    /// clusters served on this endpoint
    pub clusters: &'static [ClusterId],
}

impl NodeDescriptor {
    /// Print this node's tree to the debug log
    pub fn log(&self, device: &str) {
        debug!("------------------------------------------");
        debug!("Node: {device}");
        debug!("- Model: {}", self.model);
        debug!("- Battery: {}", self.battery);
        for endpoint in self.endpoints {
            debug!("- Endpoint: {}", endpoint.id);
            debug!("-- Clusters:");
            for cluster in endpoint.clusters {
                debug!("--- {cluster}");
            }
        }
        debug!("------------------------------------------");
    }
}
