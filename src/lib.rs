//! Core library for the meshmodel-import command line application.
//!
//! The library packages a model definition (a single file or a directory
//! tree), submits it to a Meshery server's registration endpoint and turns the
//! server's reply into a readable report. Payload preparation lives in
//! [`meshery::model::archive`], the HTTP boundary in [`meshery::model::client`],
//! the tolerant reply decoder in [`meshery::model::response`], report building
//! in [`meshery::model::report`], output destinations in
//! [`meshery::model::sink`], and the end-to-end flow in
//! [`meshery::model::import`].

pub mod meshery;

pub use meshery::model::{
    ImportError, Result, archive, client, error, import, report, response, sink,
};
