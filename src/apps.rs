//! Handles for the xflr5 applications and their object managers.
//!
//! Every handle is a thin wrapper over the shared gateway; constructing one
//! performs no remote call. Switching the GUI to an application is done on
//! the session client, not here.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::error::Error;
use crate::foil::FoilManager;
use crate::ipc::{GatewayExt, SharedGateway};
use crate::marshal::ToWire;
use crate::models::{
    AnalysisSettings2D, AnalysisSettings3D, LineStyle, OpPoint, Plane, Polar, PolarResult,
    PolarResultKind, WPolar, WPolarResult, WPolarResultKind, XDirectDisplayState,
};
use crate::wire::WireValue;

// =============================================================================
// Managers
// =============================================================================

/// Foil polars of the current project.
#[derive(Clone)]
pub struct PolarManager {
    gateway: SharedGateway,
}

impl PolarManager {
    pub fn new(gateway: SharedGateway) -> Self {
        Self { gateway }
    }

    /// Fetch the polar `polar_name` defined on `foil_name`.
    pub fn get_polar(&self, polar_name: &str, foil_name: &str) -> Result<Polar, Error> {
        // the server takes the foil first
        self.gateway
            .call("getPolar", &[foil_name.to_wire(), polar_name.to_wire()])
    }

    /// Every polar defined on `foil_name`. Results are included, so this
    /// can be a large transfer.
    pub fn polars(&self, foil_name: &str) -> Result<Vec<Polar>, Error> {
        self.gateway.call("polarList", &[foil_name.to_wire()])
    }

    /// Every polar defined on `foil_name`, keyed by polar name.
    pub fn polar_map(&self, foil_name: &str) -> Result<BTreeMap<String, Polar>, Error> {
        Ok(self
            .polars(foil_name)?
            .into_iter()
            .map(|polar| (polar.name.clone(), polar))
            .collect())
    }

    /// Make a polar current and select it in the GUI.
    pub fn set_cur_polar(&self, polar_name: &str, foil_name: &str) -> Result<(), Error> {
        self.gateway
            .call("setCurPolar", &[polar_name.to_wire(), foil_name.to_wire()])
    }
}

/// Operating points stored by past analyses.
#[derive(Clone)]
pub struct OpPointManager {
    gateway: SharedGateway,
}

impl OpPointManager {
    pub fn new(gateway: SharedGateway) -> Self {
        Self { gateway }
    }

    /// The operating point at `alpha` on the given polar and foil. Empty
    /// names select the current ones.
    pub fn get_op_point(
        &self,
        alpha: f64,
        polar_name: &str,
        foil_name: &str,
    ) -> Result<OpPoint, Error> {
        self.gateway.call(
            "getOpPoint",
            &[alpha.to_wire(), polar_name.to_wire(), foil_name.to_wire()],
        )
    }
}

/// Planes of the current project.
#[derive(Clone)]
pub struct PlaneManager {
    gateway: SharedGateway,
}

impl PlaneManager {
    pub fn new(gateway: SharedGateway) -> Self {
        Self { gateway }
    }

    /// Fetch a plane by name.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` if the server answers with a different plane.
    pub fn get_plane(&self, name: &str) -> Result<Plane, Error> {
        let plane: Plane = self.gateway.call("getPlane", &[name.to_wire()])?;
        if plane.name != name {
            return Err(Error::NotFound {
                kind: "plane",
                name: name.to_string(),
            });
        }
        Ok(plane)
    }

    /// Add `plane` to the project and its tree view.
    ///
    /// # Errors
    ///
    /// `Error::InvalidArgument` if the main wing has no sections; nothing is
    /// sent in that case.
    pub fn add_plane(&self, plane: &Plane) -> Result<(), Error> {
        if plane.wing.sections.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "plane `{}`: the main wing must have at least one section",
                plane.name
            )));
        }
        debug!(plane = %plane.name, sections = plane.wing.sections.len(), "Adding plane");
        self.gateway.call("addPlane", &[plane.to_wire()])
    }

    /// Create a plane with xflr5's default geometry and return it.
    pub fn add_default_plane(&self, name: &str) -> Result<Plane, Error> {
        let plane: Plane = self.gateway.call("addDefaultPlane", &[name.to_wire()])?;
        if plane.name != name {
            return Err(Error::NotFound {
                kind: "plane",
                name: name.to_string(),
            });
        }
        Ok(plane)
    }

    /// Summary data for a plane, as the server reports it. The layout is not
    /// fixed, so it is returned untyped.
    pub fn plane_data(&self, name: &str) -> Result<WireValue, Error> {
        Ok(self.gateway.invoke("getPlaneData", &[name.to_wire()])?)
    }
}

// =============================================================================
// Applications
// =============================================================================

/// Direct foil design.
#[derive(Clone)]
pub struct AFoil {
    gateway: SharedGateway,
    foils: FoilManager,
}

impl AFoil {
    pub fn new(gateway: SharedGateway) -> Self {
        Self {
            foils: FoilManager::new(gateway.clone()),
            gateway,
        }
    }

    pub fn foils(&self) -> &FoilManager {
        &self.foils
    }

    /// Generate a 4- or 5-digit NACA foil. Without a name it is called
    /// `NACA<digits>`.
    pub fn create_naca_foil(&self, digits: u32, name: Option<&str>) -> Result<(), Error> {
        let name = match name {
            Some(name) => name.to_string(),
            None => format!("NACA{}", digits),
        };
        info!(digits, name = %name, "Creating NACA foil");
        self.gateway
            .call("createNACAFoil", &[digits.to_wire(), name.to_wire()])
    }

    /// Show or hide a foil in the design view.
    pub fn show_foil(&self, name: &str, visible: bool) -> Result<(), Error> {
        self.gateway
            .call("showFoil", &[name.to_wire(), visible.to_wire()])
    }

    pub fn line_style(&self, name: &str) -> Result<LineStyle, Error> {
        self.gateway.call("getLineStyle", &[name.to_wire()])
    }

    pub fn set_line_style(&self, name: &str, style: &LineStyle) -> Result<(), Error> {
        self.gateway
            .call("setLineStyle", &[name.to_wire(), style.to_wire()])
    }
}

/// Foil analysis.
#[derive(Clone)]
pub struct XDirect {
    gateway: SharedGateway,
    foils: FoilManager,
    polars: PolarManager,
    op_points: OpPointManager,
}

impl XDirect {
    pub fn new(gateway: SharedGateway) -> Self {
        Self {
            foils: FoilManager::new(gateway.clone()),
            polars: PolarManager::new(gateway.clone()),
            op_points: OpPointManager::new(gateway.clone()),
            gateway,
        }
    }

    pub fn foils(&self) -> &FoilManager {
        &self.foils
    }

    pub fn polars(&self) -> &PolarManager {
        &self.polars
    }

    pub fn op_points(&self) -> &OpPointManager {
        &self.op_points
    }

    /// Create `polar` on the server. The whole definition is sent since the
    /// server allocates a new polar every time.
    pub fn define_analysis(&self, polar: &Polar) -> Result<(), Error> {
        info!(polar = %polar.name, foil = %polar.foil_name, "Defining 2D analysis");
        self.gateway.call("defineAnalysis2D", &[polar.to_wire()])
    }

    /// Run the current polar and return the requested result columns.
    pub fn analyze(
        &self,
        settings: &AnalysisSettings2D,
        result_list: &[PolarResultKind],
    ) -> Result<PolarResult, Error> {
        self.gateway
            .call("analyzeCurPolar", &[settings.to_wire(), result_list.to_wire()])
    }

    pub fn set_display_state(&self, state: &XDirectDisplayState) -> Result<(), Error> {
        self.gateway.call("setXDirectDisplay", &[state.to_wire()])
    }

    pub fn display_state(&self) -> Result<XDirectDisplayState, Error> {
        self.gateway.call("getXDirectDisplay", &[])
    }
}

/// Plane design and analysis.
#[derive(Clone)]
pub struct Miarex {
    gateway: SharedGateway,
    planes: PlaneManager,
}

impl Miarex {
    pub fn new(gateway: SharedGateway) -> Self {
        Self {
            planes: PlaneManager::new(gateway.clone()),
            gateway,
        }
    }

    pub fn planes(&self) -> &PlaneManager {
        &self.planes
    }

    /// Create `wpolar` on the server.
    pub fn define_analysis(&self, wpolar: &WPolar) -> Result<(), Error> {
        info!(polar = %wpolar.name, plane = %wpolar.plane_name, "Defining 3D analysis");
        self.gateway.call("defineAnalysis3D", &[wpolar.to_wire()])
    }

    /// Analyse the named plane polar and return the requested columns.
    pub fn analyze(
        &self,
        polar_name: &str,
        plane_name: &str,
        settings: &AnalysisSettings3D,
        result_list: &[WPolarResultKind],
    ) -> Result<WPolarResult, Error> {
        self.gateway.call(
            "analyzeWPolar",
            &[
                polar_name.to_wire(),
                plane_name.to_wire(),
                settings.to_wire(),
                result_list.to_wire(),
            ],
        )
    }
}

/// Inverse foil design. The server exposes no operations for it yet.
#[derive(Clone)]
pub struct XInverse {
    gateway: SharedGateway,
}

impl XInverse {
    pub fn new(gateway: SharedGateway) -> Self {
        Self { gateway }
    }

    /// The gateway this handle issues calls through.
    pub fn gateway(&self) -> &SharedGateway {
        &self.gateway
    }
}
