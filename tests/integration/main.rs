//! End-to-end tests driving `LaneBotsPlugin` through a scripted host.

mod match_flow;
