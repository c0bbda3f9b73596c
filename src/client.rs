//! Session entry point.

use std::sync::Arc;

use tracing::{info, warn};

use crate::apps::{AFoil, Miarex, XDirect, XInverse};
use crate::config::ClientConfig;
use crate::error::Error;
use crate::ipc::{GatewayExt, RpcClient, SharedGateway};
use crate::marshal::ToWire;
use crate::models::{App, State};

/// Handle to one of the xflr5 applications.
#[derive(Clone)]
pub enum Application {
    /// No application is active.
    None,
    XDirect(XDirect),
    AFoil(AFoil),
    XInverse(XInverse),
    Miarex(Miarex),
}

impl Application {
    /// Which application this handle drives.
    pub fn app(&self) -> App {
        match self {
            Application::None => App::NoApp,
            Application::XDirect(_) => App::XFoilAnalysis,
            Application::AFoil(_) => App::DirectDesign,
            Application::XInverse(_) => App::InverseDesign,
            Application::Miarex(_) => App::Miarex,
        }
    }
}

/// A connected xflr5 session.
///
/// # Example
///
/// ```ignore
/// use xflr_client::{App, ClientConfig, XflrClient};
///
/// let xp = XflrClient::connect(&ClientConfig::resolve()?)?;
/// let app = xp.load_project(&["/home/me/projects/test1.xfl"], false)?;
/// xp.set_app(App::Miarex)?;
/// println!("{:?}", xp.state()?);
/// ```
pub struct XflrClient {
    gateway: SharedGateway,
}

impl XflrClient {
    /// Connect to the server and check that it answers.
    pub fn connect(config: &ClientConfig) -> Result<Self, Error> {
        let rpc = RpcClient::connect(config)?;
        let client = Self::from_gateway(Arc::new(rpc));
        if !client.ping()? {
            warn!(endpoint = %config.endpoint(), "Server answered ping with false");
        }
        Ok(client)
    }

    /// Wrap an existing gateway. No call is made.
    pub fn from_gateway(gateway: SharedGateway) -> Self {
        Self { gateway }
    }

    /// The underlying gateway, for calls not covered by the typed API.
    pub fn gateway(&self) -> &SharedGateway {
        &self.gateway
    }

    pub fn ping(&self) -> Result<bool, Error> {
        self.gateway.call("ping", &[])
    }

    /// Load project or foil files and return the application the GUI ends
    /// up in.
    ///
    /// With `save_current`, the open project is saved first.
    pub fn load_project<S: AsRef<str>>(&self, files: &[S], save_current: bool) -> Result<App, Error> {
        if files.is_empty() {
            return Err(Error::InvalidArgument("no project files given".to_string()));
        }
        if save_current {
            self.save_project()?;
        }
        let files: Vec<&str> = files.iter().map(AsRef::as_ref).collect();
        info!(files = ?files, "Loading project");
        self.gateway.call::<()>("loadProject", &[files.to_wire()])?;
        Ok(self.state()?.app)
    }

    /// Start an empty project. Unsaved changes are discarded.
    pub fn new_project(&self) -> Result<(), Error> {
        info!("Creating new project");
        self.gateway.call("newProject", &[])
    }

    /// Save the project to its current path.
    pub fn save_project(&self) -> Result<(), Error> {
        info!("Saving project");
        self.gateway.call("saveProject", &[])
    }

    /// Snapshot of the project-level state.
    pub fn state(&self) -> Result<State, Error> {
        self.gateway.call("getState", &[])
    }

    /// Set where the next save writes the project.
    pub fn set_project_path(&self, path: &str) -> Result<(), Error> {
        self.gateway.call("setProjectPath", &[path.to_wire()])
    }

    /// Switch the GUI to `app`.
    pub fn set_app(&self, app: App) -> Result<(), Error> {
        info!(app = %app, "Switching application");
        self.gateway.call("setApp", &[app.to_wire()])
    }

    /// Handle for `app`. Does not switch the GUI; see [`set_app`](Self::set_app).
    pub fn app(&self, app: App) -> Application {
        let gateway = self.gateway.clone();
        match app {
            App::NoApp => Application::None,
            App::XFoilAnalysis => Application::XDirect(XDirect::new(gateway)),
            App::DirectDesign => Application::AFoil(AFoil::new(gateway)),
            App::InverseDesign => Application::XInverse(XInverse::new(gateway)),
            App::Miarex => Application::Miarex(Miarex::new(gateway)),
        }
    }

    /// Handle for whichever application the GUI currently shows.
    pub fn current_app(&self) -> Result<Application, Error> {
        Ok(self.app(self.state()?.app))
    }

    pub fn afoil(&self) -> AFoil {
        AFoil::new(self.gateway.clone())
    }

    pub fn xdirect(&self) -> XDirect {
        XDirect::new(self.gateway.clone())
    }

    pub fn miarex(&self) -> Miarex {
        Miarex::new(self.gateway.clone())
    }

    pub fn xinverse(&self) -> XInverse {
        XInverse::new(self.gateway.clone())
    }

    /// Stop the server and close xflr5.
    pub fn exit(self) -> Result<(), Error> {
        info!("Closing xflr5");
        self.gateway.call("exit", &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{wire_map, MockGateway};
    use crate::wire::WireValue;
    use pretty_assertions::assert_eq;

    fn state_wire(app: i64) -> WireValue {
        wire_map(vec![
            ("projectPath", "/tmp/test1.xfl".into()),
            ("projectName", "test1".into()),
            ("app", WireValue::Int(app)),
            ("saved", WireValue::Bool(true)),
            ("display", WireValue::Bool(true)),
        ])
    }

    #[test]
    fn test_load_project_without_saving() {
        let (gateway, mock) = MockGateway::shared();
        mock.reply(WireValue::Nil).reply(state_wire(2));
        let xp = XflrClient::from_gateway(gateway);

        let app = xp.load_project(&["/tmp/test1.xfl"], false).expect("load");

        assert_eq!(app, App::DirectDesign);
        assert_eq!(mock.methods(), vec!["loadProject", "getState"]);
        assert_eq!(
            mock.calls()[0].args,
            vec![WireValue::Array(vec!["/tmp/test1.xfl".into()])]
        );
    }

    #[test]
    fn test_load_project_saves_first() {
        let (gateway, mock) = MockGateway::shared();
        mock.reply(WireValue::Nil)
            .reply(WireValue::Nil)
            .reply(state_wire(4));
        let xp = XflrClient::from_gateway(gateway);

        let app = xp.load_project(&["a.xfl"], true).expect("load");

        assert_eq!(app, App::Miarex);
        assert_eq!(mock.methods(), vec!["saveProject", "loadProject", "getState"]);
    }

    #[test]
    fn test_load_project_rejects_empty_list() {
        let (gateway, mock) = MockGateway::shared();
        let xp = XflrClient::from_gateway(gateway);

        let files: [&str; 0] = [];
        assert!(matches!(
            xp.load_project(&files, false),
            Err(Error::InvalidArgument(_))
        ));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_state_with_unknown_app_fails_closed() {
        let (gateway, mock) = MockGateway::shared();
        mock.reply(state_wire(9));

        let err = XflrClient::from_gateway(gateway).state().unwrap_err();
        assert!(err.is_invalid_enum());
    }

    #[test]
    fn test_set_app_sends_integer() {
        let (gateway, mock) = MockGateway::shared();
        let xp = XflrClient::from_gateway(gateway);

        xp.set_app(App::Miarex).expect("set app");
        xp.set_project_path("/tmp/p.xfl").expect("set path");

        let calls = mock.calls();
        assert_eq!(calls[0].method, "setApp");
        assert_eq!(calls[0].args, vec![WireValue::Int(4)]);
        assert_eq!(calls[1].args, vec![WireValue::from("/tmp/p.xfl")]);
    }

    #[test]
    fn test_app_handles_make_no_calls() {
        let (gateway, mock) = MockGateway::shared();
        let xp = XflrClient::from_gateway(gateway);

        for app in [
            App::NoApp,
            App::XFoilAnalysis,
            App::DirectDesign,
            App::InverseDesign,
            App::Miarex,
        ] {
            assert_eq!(xp.app(app).app(), app);
        }
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_current_app_follows_state() {
        let (gateway, mock) = MockGateway::shared();
        mock.reply(state_wire(1));
        let xp = XflrClient::from_gateway(gateway);

        let app = xp.current_app().expect("current app");
        assert!(matches!(app, Application::XDirect(_)));
    }

    #[test]
    fn test_session_commands() {
        let (gateway, mock) = MockGateway::shared();
        mock.reply(true);
        let xp = XflrClient::from_gateway(gateway);

        assert!(xp.ping().expect("ping"));
        xp.new_project().expect("new");
        xp.save_project().expect("save");
        xp.exit().expect("exit");

        assert_eq!(mock.methods(), vec!["ping", "newProject", "saveProject", "exit"]);
    }
}
