//! Scripted xflr5 session: load a project, morph a foil, build a plane and
//! run a 3D analysis on it.
//!
//! ```bash
//! RUST_LOG=xflr_client=debug cargo run --example session -- /path/to/test1.xfl
//! ```
//!
//! The server address comes from the config file and `XFLR_*` variables.
//! Foil names below match the sample project shipped with xflr5; change them
//! to suit your own project.

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use xflr_client::{
    AnalysisMethod, AnalysisSettings3D, App, ClientConfig, Coord, GeomChange, LineStipple, Plane,
    PolarType, WPolar, WPolarResultKind, WingSection, XflrClient,
};

const FOIL: &str = "MH 60  10.08%";
const ROOT_FOIL: &str = "fuselage center";

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "xflr_client=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let project = std::env::args()
        .nth(1)
        .context("usage: session <project.xfl>")?;

    let config = ClientConfig::resolve()?;
    let xp = XflrClient::connect(&config)
        .with_context(|| format!("Failed to reach xflr5 at {}", config.endpoint()))?;

    // ======== Project management ========

    let app = xp.load_project(&[project.as_str()], false)?;
    tracing::info!("Project loaded into {}", app);

    xp.set_app(App::DirectDesign)?;
    println!("{:#?}", xp.state()?);

    // ======== Airfoil morphing ========

    let afoil = xp.afoil();
    let foil_map = afoil.foils().foil_map()?;
    println!("{} foils in project", foil_map.len());

    let mut foil = afoil.foils().get_foil(FOIL)?;
    println!("{:#?}", foil);

    let mut coords = foil.coords()?;
    if coords.len() > 10 {
        coords[10] = Coord::new(0.1, 0.01);
        foil.set_coords(&coords)?;
    }

    foil.set_geom(GeomChange {
        camber: 0.03,
        ..GeomChange::default()
    })?;
    foil.set_geom(GeomChange {
        thickness: 0.15,
        camber_x: 0.27,
        ..GeomChange::default()
    })?;

    let mut style = afoil.line_style(&foil.name)?.with_rgba(255, 0, 0, 255);
    style.stipple = LineStipple::DashDot;
    afoil.set_line_style(&foil.name, &style)?;

    // ======== Plane morphing ========

    xp.set_app(App::Miarex)?;
    let miarex = xp.miarex();

    let mut plane = Plane::new("custom_plane");
    plane.wing.sections.push(WingSection {
        chord: 0.2,
        ..WingSection::default().with_foil(ROOT_FOIL)
    });
    plane.wing.sections.push(WingSection {
        y_position: 1.0,
        chord: 0.1,
        offset: 0.2,
        twist: 5.0,
        dihedral: 5.0,
        ..WingSection::default().with_foil(FOIL)
    });
    miarex.planes().add_plane(&plane)?;
    println!("{}", miarex.planes().plane_data(&plane.name)?);

    // ======== 3D analysis ========

    let mut wpolar = WPolar::new("my_cute_polar", &plane.name);
    wpolar.spec.polar_type = PolarType::FixedSpeedPolar;
    wpolar.spec.free_stream_speed = 12.0;
    wpolar.spec.analysis_method = AnalysisMethod::VlmMethod;
    miarex.define_analysis(&wpolar)?;

    let settings = AnalysisSettings3D {
        is_sequence: true,
        sequence: (0.0, 10.0, 1.0),
        ..AnalysisSettings3D::default()
    };
    let results = miarex.analyze(
        &wpolar.name,
        &plane.name,
        &settings,
        &[WPolarResultKind::Alpha, WPolarResultKind::ClCd],
    )?;

    for (alpha, cl_cd) in results
        .column(WPolarResultKind::Alpha)
        .iter()
        .zip(results.column(WPolarResultKind::ClCd))
    {
        println!("alpha {:>5.1}  Cl/Cd {:>7.3}", alpha, cl_cd);
    }

    Ok(())
}
