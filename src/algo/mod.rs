//! Mesh processing algorithms.
//!
//! - **Approximation**: variational shape approximation by planar proxies
//! - **Geodesics**: Dijkstra shortest paths on the edge graph

pub mod approximate;
pub mod geodesic;
