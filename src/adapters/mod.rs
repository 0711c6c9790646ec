/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Adapters: concrete implementations of the secondary ports

pub mod secondary {
    pub mod command {
        pub mod replay;
        pub mod unix;

        pub use replay::ReplayCommandExecutor;
        pub use unix::UnixCommandExecutor;
    }

    pub mod config {
        pub mod toml_file;

        pub use toml_file::TomlConfigurationProvider;
    }

    pub mod filesystem {
        pub mod by_path;

        pub use by_path::ByPathProbe;
    }

    pub mod publisher {
        pub mod stdout;
        pub mod textfile;

        pub use stdout::StdoutPublisher;
        pub use textfile::TextfilePublisher;
    }

    pub use command::*;
    pub use config::*;
    pub use filesystem::*;
    pub use publisher::*;
}

pub use secondary::*;
