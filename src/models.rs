//! Payload types exchanged with the xflr5 server.
//!
//! Field names on the wire follow the server's adapters, which is why some
//! keys keep xflr5's capitalisation (`Re_type`, `Cl`, `projectPath`). Every
//! type here is a plain snapshot: changing a field locally has no remote
//! effect until the object is passed back to a manager method.

use crate::marshal::{DecodeError, FromWire, ToWire};
use crate::wire::WireValue;
use crate::{wire_enum, wire_object};

// =============================================================================
// Miscellaneous
// =============================================================================

wire_enum! {
    /// Pen pattern of a curve.
    pub enum LineStipple {
        Solid = 0,
        Dash = 1,
        Dot = 2,
        DashDot = 3,
        DashDotDot = 4,
        NoLine = 5,
    }
}

wire_enum! {
    /// Marker drawn at each curve point.
    pub enum PointStyle {
        NoSymbol = 0,
        LittleCircle = 1,
        BigCircle = 2,
        LittleSquare = 3,
        BigSquare = 4,
        Triangle = 5,
        TriangleInv = 6,
        LittleCircleF = 7,
        BigCircleF = 8,
        LittleSquareF = 9,
        BigSquareF = 10,
        TriangleF = 11,
        TriangleInvF = 12,
        LittleCross = 13,
        BigCross = 14,
    }
}

wire_object! {
    /// How a foil (or any curve) is drawn in the GUI.
    pub struct LineStyle {
        visible: bool = true,
        stipple: LineStipple = LineStipple::Solid,
        point_style: PointStyle = PointStyle::NoSymbol,
        width: i64 = 1,
        /// `[r, g, b, a]`, each 0..=255.
        color: Vec<i64> = Vec::new(),
        tag: String = String::new(),
    }
}

impl LineStyle {
    /// Set the colour from its four components.
    pub fn with_rgba(mut self, r: u8, g: u8, b: u8, a: u8) -> Self {
        self.color = vec![r.into(), g.into(), b.into(), a.into()];
        self
    }
}

/// A foil contour point. Encoded as `[x, y]` rather than a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Coord {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl ToWire for Coord {
    fn to_wire(&self) -> WireValue {
        (self.x, self.y).to_wire()
    }
}

impl FromWire for Coord {
    fn from_wire(value: &WireValue) -> Result<Self, DecodeError> {
        <(f64, f64)>::from_wire(value).map(Coord::from)
    }
}

// =============================================================================
// XDirect (foil analysis)
// =============================================================================

wire_enum! {
    pub enum SequenceType {
        Alpha = 0,
        Cl = 1,
        Reynolds = 2,
    }
}

wire_enum! {
    pub enum PolarType {
        FixedSpeedPolar = 0,
        FixedLiftPolar = 1,
        RubberChordPolar = 2,
        FixedAoaPolar = 3,
        StabilityPolar = 4,
        BetaPolar = 5,
    }
}

wire_enum! {
    pub enum GraphView {
        OneGraph = 0,
        TwoGraphs = 1,
        FourGraphs = 2,
        AllGraphs = 3,
        NoGraph = 4,
    }
}

wire_enum! {
    /// Selects a column of a foil polar result.
    pub enum PolarResultKind {
        Alpha = 0,
        Cl = 1,
        XCp = 2,
        Cd = 3,
        Cdp = 4,
        Cm = 5,
        XTr1 = 6,
        XTr2 = 7,
        HMom = 8,
        Cpmn = 9,
        ClCd = 10,
        Cl32Cd = 11,
        RtCl = 12,
        Re = 13,
    }
}

wire_object! {
    /// Which views the XDirect panel shows.
    pub struct XDirectDisplayState {
        /// `false` shows the operating point view instead.
        polar_view: bool = true,
        graph_view: GraphView = GraphView::AllGraphs,
        which_graph: i64 = 1,
        active_opp_only: bool = true,
        show_bl: bool = false,
        show_pressure: bool = false,
        /// `false` shows the Q graph instead.
        show_cpgraph: bool = true,
        animated: bool = false,
        /// 0..=1000
        ani_speed: i64 = 500,
    }
}

wire_object! {
    /// Right-hand analysis pane of XDirect.
    pub struct AnalysisSettings2D {
        sequence_type: SequenceType = SequenceType::Alpha,
        /// `(start, end, step)`
        sequence: (f64, f64, f64) = (0.0, 0.0, 0.0),
        is_sequence: bool = false,
        init_bl as "init_BL": bool = true,
        store_opp: bool = true,
        viscous: bool = true,
        keep_open_on_error: bool = false,
    }
}

wire_object! {
    /// A single operating point result.
    pub struct OpPoint {
        alpha: f64 = 0.0,
        polar_name: String = String::new(),
        foil_name: String = String::new(),
        cl as "Cl": f64 = 0.0,
        xcp as "XCp": f64 = 0.0,
        cd as "Cd": f64 = 0.0,
        cdp as "Cdp": f64 = 0.0,
        cm as "Cm": f64 = 0.0,
        xtr1 as "XTr1": f64 = 0.0,
        xtr2 as "XTr2": f64 = 0.0,
        hmom as "HMom": f64 = 0.0,
        cpmn as "Cpmn": f64 = 0.0,
        re as "Re": f64 = 0.0,
        mach: f64 = 0.0,
    }
}

wire_object! {
    /// Definition of a foil polar.
    pub struct PolarSpec {
        polar_type: PolarType = PolarType::FixedSpeedPolar,
        re_type as "Re_type": i64 = 1,
        ma_type: i64 = 1,
        aoa: f64 = 0.0,
        mach: f64 = 0.0,
        ncrit: f64 = 9.0,
        xtop: f64 = 1.0,
        xbot: f64 = 1.0,
        reynolds: f64 = 100_000.0,
    }
}

wire_object! {
    /// Columns of a foil polar. Only the columns requested in the analysis
    /// call are filled; the rest stay empty.
    pub struct PolarResult {
        alpha: Vec<f64> = Vec::new(),
        cl as "Cl": Vec<f64> = Vec::new(),
        xcp as "XCp": Vec<f64> = Vec::new(),
        cd as "Cd": Vec<f64> = Vec::new(),
        cdp as "Cdp": Vec<f64> = Vec::new(),
        cm as "Cm": Vec<f64> = Vec::new(),
        xtr1 as "XTr1": Vec<f64> = Vec::new(),
        xtr2 as "XTr2": Vec<f64> = Vec::new(),
        hmom as "HMom": Vec<f64> = Vec::new(),
        cpmn as "Cpmn": Vec<f64> = Vec::new(),
        cl_cd as "ClCd": Vec<f64> = Vec::new(),
        cl32_cd as "Cl32Cd": Vec<f64> = Vec::new(),
        rt_cl as "RtCl": Vec<f64> = Vec::new(),
        re as "Re": Vec<f64> = Vec::new(),
    }
}

impl PolarResult {
    /// Number of operating points in the result.
    pub fn len(&self) -> usize {
        self.alpha.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alpha.is_empty()
    }

    /// The column selected by `kind`.
    pub fn column(&self, kind: PolarResultKind) -> &[f64] {
        match kind {
            PolarResultKind::Alpha => &self.alpha,
            PolarResultKind::Cl => &self.cl,
            PolarResultKind::XCp => &self.xcp,
            PolarResultKind::Cd => &self.cd,
            PolarResultKind::Cdp => &self.cdp,
            PolarResultKind::Cm => &self.cm,
            PolarResultKind::XTr1 => &self.xtr1,
            PolarResultKind::XTr2 => &self.xtr2,
            PolarResultKind::HMom => &self.hmom,
            PolarResultKind::Cpmn => &self.cpmn,
            PolarResultKind::ClCd => &self.cl_cd,
            PolarResultKind::Cl32Cd => &self.cl32_cd,
            PolarResultKind::RtCl => &self.rt_cl,
            PolarResultKind::Re => &self.re,
        }
    }
}

wire_object! {
    /// A foil polar: its definition and, once analysed, its results.
    pub struct Polar {
        name: String = String::new(),
        foil_name: String = String::new(),
        spec: PolarSpec = PolarSpec::default(),
        result: PolarResult = PolarResult::default(),
    }
}

impl Polar {
    pub fn new(name: impl Into<String>, foil_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            foil_name: foil_name.into(),
            ..Self::default()
        }
    }
}

// =============================================================================
// Mainframe
// =============================================================================

wire_enum! {
    /// Top-level xflr5 application.
    pub enum App {
        NoApp = 0,
        XFoilAnalysis = 1,
        DirectDesign = 2,
        InverseDesign = 3,
        Miarex = 4,
    }
}

wire_object! {
    /// Project-level state of the running xflr5 instance.
    pub struct State {
        project_path as "projectPath": String = String::new(),
        project_name as "projectName": String = String::new(),
        app: App = App::NoApp,
        saved: bool = false,
        display: bool = true,
    }
}

// =============================================================================
// Miarex (plane design)
// =============================================================================

wire_enum! {
    pub enum WingType {
        MainWing = 0,
        SecondWing = 1,
        Elevator = 2,
        Fin = 3,
    }
}

wire_object! {
    /// One spanwise station of a wing.
    pub struct WingSection {
        /// Spanwise position (m).
        y_position: f64 = 0.0,
        /// Length in the longitudinal direction (m).
        chord: f64 = 0.1,
        /// Leading-edge x position from the origin (m).
        offset: f64 = 0.05,
        /// Dihedral up to the next section (deg).
        dihedral: f64 = 0.0,
        /// Twist about the spanwise axis (deg).
        twist: f64 = 0.0,
        right_foil_name: String = String::new(),
        left_foil_name: String = String::new(),
        n_x_panels: i64 = 7,
        x_panel_dist: i64 = 0,
        n_y_panels: i64 = 7,
        y_panel_dist: i64 = 0,
    }
}

impl WingSection {
    /// A section using the same foil on both sides.
    pub fn with_foil(mut self, foil_name: impl Into<String>) -> Self {
        let foil_name = foil_name.into();
        self.right_foil_name = foil_name.clone();
        self.left_foil_name = foil_name;
        self
    }
}

wire_object! {
    pub struct Wing {
        /// Role of the wing on the plane.
        wing_type as "type": WingType = WingType::MainWing,
        sections: Vec<WingSection> = Vec::new(),
    }
}

impl Wing {
    pub fn new(wing_type: WingType) -> Self {
        Self {
            wing_type,
            sections: Vec::new(),
        }
    }
}

wire_object! {
    pub struct Plane {
        name: String = "Plane Name".to_string(),
        wing: Wing = Wing::new(WingType::MainWing),
        wing2: Wing = Wing::new(WingType::SecondWing),
        elevator: Wing = Wing::new(WingType::Elevator),
        fin: Wing = Wing::new(WingType::Fin),
    }
}

impl Plane {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

wire_enum! {
    pub enum AnalysisMethod {
        LltMethod = 0,
        VlmMethod = 1,
        Panel4Method = 2,
        TriLinMethod = 3,
        TriUniMethod = 4,
    }
}

wire_enum! {
    pub enum RefDimension {
        PlanformRefDim = 0,
        ProjectedRefDim = 1,
        ManualRefDim = 2,
    }
}

wire_object! {
    /// Definition of a plane polar.
    pub struct WPolarSpec {
        polar_type: PolarType = PolarType::FixedSpeedPolar,
        free_stream_speed: f64 = 10.0,
        /// Angle of attack (deg).
        alpha: f64 = 0.0,
        /// Sideslip angle (deg).
        beta: f64 = 0.0,

        analysis_method: AnalysisMethod = AnalysisMethod::VlmMethod,
        is_viscous: bool = true,

        use_plane_intertia: bool = true,
        plane_mass: f64 = 0.0,
        x_cog: f64 = 0.0,
        z_cog: f64 = 0.0,

        ref_dimension: RefDimension = RefDimension::ProjectedRefDim,
        ref_area: f64 = 0.0,
        ref_chord: f64 = 0.0,
        ref_span: f64 = 0.0,

        /// kg/m³
        density: f64 = 1.225,
        /// m²/s
        kinematic_viscosity: f64 = 1.5e-5,
        is_ground_effect: bool = false,
        /// Height above ground when ground effect is on (m).
        height: f64 = 0.0,
    }
}

wire_object! {
    /// Columns of a plane polar.
    pub struct WPolarResult {
        alpha: Vec<f64> = Vec::new(),
        beta: Vec<f64> = Vec::new(),
        q_inf as "Q_inf": Vec<f64> = Vec::new(),

        cl as "Cl": Vec<f64> = Vec::new(),
        cl_cd as "ClCd": Vec<f64> = Vec::new(),
        cl32_cd as "Cl32Cd": Vec<f64> = Vec::new(),

        /// Total drag
        tcd as "TCd": Vec<f64> = Vec::new(),
        /// Induced drag
        icd as "ICd": Vec<f64> = Vec::new(),
        /// Profile drag
        pcd as "PCd": Vec<f64> = Vec::new(),

        cm as "Cm": Vec<f64> = Vec::new(),
        icm as "ICm": Vec<f64> = Vec::new(),
        iym as "IYm": Vec<f64> = Vec::new(),
        vcm as "VCm": Vec<f64> = Vec::new(),

        fz as "FZ": Vec<f64> = Vec::new(),
        fx as "FX": Vec<f64> = Vec::new(),
        fy as "FY": Vec<f64> = Vec::new(),

        rm as "Rm": Vec<f64> = Vec::new(),
        pm as "Pm": Vec<f64> = Vec::new(),
        max_bending: Vec<f64> = Vec::new(),

        /// Neutral point
        xcp_cl as "XCpCl": Vec<f64> = Vec::new(),
        /// Static margin
        sm as "SM": Vec<f64> = Vec::new(),
    }
}

impl WPolarResult {
    /// The column selected by `kind`.
    pub fn column(&self, kind: WPolarResultKind) -> &[f64] {
        match kind {
            WPolarResultKind::Alpha => &self.alpha,
            WPolarResultKind::Cl => &self.cl,
            WPolarResultKind::XCpCl => &self.xcp_cl,
            WPolarResultKind::Cd => &self.tcd,
            WPolarResultKind::Cdp => &self.pcd,
            WPolarResultKind::Cm => &self.cm,
            WPolarResultKind::ICd => &self.icd,
            WPolarResultKind::Sm => &self.sm,
            WPolarResultKind::Fx => &self.fx,
            WPolarResultKind::Fy => &self.fy,
            WPolarResultKind::ClCd => &self.cl_cd,
            WPolarResultKind::Cl32Cd => &self.cl32_cd,
            WPolarResultKind::Fz => &self.fz,
            WPolarResultKind::QInf => &self.q_inf,
        }
    }
}

wire_object! {
    /// A plane polar: its definition and results.
    pub struct WPolar {
        name: String = String::new(),
        plane_name: String = String::new(),
        spec: WPolarSpec = WPolarSpec::default(),
        result: WPolarResult = WPolarResult::default(),
    }
}

impl WPolar {
    pub fn new(name: impl Into<String>, plane_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plane_name: plane_name.into(),
            ..Self::default()
        }
    }
}

wire_enum! {
    /// Selects a column of a plane polar result.
    pub enum WPolarResultKind {
        Alpha = 0,
        Cl = 1,
        XCpCl = 2,
        Cd = 3,
        Cdp = 4,
        Cm = 5,
        ICd = 6,
        Sm = 7,
        Fx = 8,
        Fy = 9,
        ClCd = 10,
        Cl32Cd = 11,
        Fz = 12,
        QInf = 13,
    }
}

wire_object! {
    /// Right-hand analysis pane of Miarex.
    pub struct AnalysisSettings3D {
        /// `(start, end, step)`
        sequence: (f64, f64, f64) = (0.0, 0.0, 0.0),
        is_sequence: bool = false,
        init_llt as "init_LLT": bool = true,
        store_opp: bool = true,
    }
}
