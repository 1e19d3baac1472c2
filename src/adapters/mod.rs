//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements            | Connects to                  |
//! |-----------------|-----------------------|------------------------------|
//! | `config_file`   | ConfigPort            | JSON settings file           |
//! | `json_channel`  | CommandChannel        | JSON-lines writer            |
//! |                 | AsyncCommandTransport |                              |
//! | `log_sink`      | EventSink             | `log` records                |
//! | `replay_source` | ReadingSource         | JSON-lines recording         |
//! | `time`          | Clock                 | manual replay/test time      |

pub mod config_file;
pub mod json_channel;
pub mod log_sink;
pub mod replay_source;
pub mod time;
