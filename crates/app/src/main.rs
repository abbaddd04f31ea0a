mod capabilities;

use std::fmt;
use std::sync::Arc;

use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use exam_core::model::Role;
use services::{
    AttemptLoopService, Clock, CurriculumService, HttpAttemptApi, HttpCurriculumApi,
    HttpTenantDirectory, HttpTestCatalog, InMemoryCurriculumApi, LocalAttemptApi, MockTestCatalog,
    StaticTenantDirectory, TenantKey, TenantProfile, TenantResolver, TestSource,
};
use services::proctoring::{FullscreenSurface, MediaDevices};
use ui::{App, UiApp, build_app_context};

use capabilities::{SimulatedFullscreen, SimulatedMediaDevices};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidRole { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidRole { raw } => write!(f, "invalid --role value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

struct DesktopApp {
    role: Role,
    tenant: Option<TenantProfile>,
    test_source: TestSource,
    attempt_loop: Arc<AttemptLoopService>,
    curriculum: Arc<CurriculumService>,
    media_devices: Arc<dyn MediaDevices>,
    fullscreen: Arc<dyn FullscreenSurface>,
}

impl UiApp for DesktopApp {
    fn role(&self) -> Role {
        self.role
    }

    fn tenant(&self) -> Option<TenantProfile> {
        self.tenant.clone()
    }

    fn test_source(&self) -> TestSource {
        self.test_source
    }

    fn attempt_loop(&self) -> Arc<AttemptLoopService> {
        Arc::clone(&self.attempt_loop)
    }

    fn curriculum(&self) -> Arc<CurriculumService> {
        Arc::clone(&self.curriculum)
    }

    fn media_devices(&self) -> Arc<dyn MediaDevices> {
        Arc::clone(&self.media_devices)
    }

    fn fullscreen(&self) -> Arc<dyn FullscreenSurface> {
        Arc::clone(&self.fullscreen)
    }
}

struct Args {
    api_url: String,
    host: String,
    base_domain: String,
    role: Role,
    mock: bool,
    deny_media: bool,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--api <url>] [--host <hostname>] [--role <admin|teacher|student>]");
    eprintln!("                      [--base-domain <domain>] [--mock] [--deny-media]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --api https://api.examhall.app");
    eprintln!("  --host demo.examhall.app");
    eprintln!("  --base-domain examhall.app");
    eprintln!("  --role student");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAMHALL_API_URL, EXAMHALL_HOST, EXAMHALL_BASE_DOMAIN, EXAMHALL_ROLE");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut api_url = std::env::var("EXAMHALL_API_URL")
            .unwrap_or_else(|_| "https://api.examhall.app".to_string());
        let mut host =
            std::env::var("EXAMHALL_HOST").unwrap_or_else(|_| "demo.examhall.app".to_string());
        let mut base_domain =
            std::env::var("EXAMHALL_BASE_DOMAIN").unwrap_or_else(|_| "examhall.app".to_string());
        let mut role = std::env::var("EXAMHALL_ROLE")
            .ok()
            .and_then(|value| value.parse::<Role>().ok())
            .unwrap_or(Role::Student);
        let mut mock = false;
        let mut deny_media = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api" => api_url = require_value(args, "--api")?,
                "--host" => host = require_value(args, "--host")?,
                "--base-domain" => base_domain = require_value(args, "--base-domain")?,
                "--role" => {
                    let value = require_value(args, "--role")?;
                    role = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidRole { raw: value.clone() })?;
                }
                "--mock" => mock = true,
                "--deny-media" => deny_media = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            api_url,
            host,
            base_domain,
            role,
            mock,
            deny_media,
        })
    }
}

fn demo_tenant_directory() -> StaticTenantDirectory {
    StaticTenantDirectory::new().with_profile(
        TenantKey::Subdomain("demo".to_string()),
        TenantProfile {
            tenant_id: exam_core::model::TenantId::new("tn-demo"),
            name: "Demo Academy".to_string(),
        },
    )
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let clock = Clock::default_clock();
    let http = reqwest::Client::new();

    // Tenant resolution happens once at startup; the resolved profile is
    // plain data injected into the UI, not ambient global state.
    let resolver = if args.mock {
        TenantResolver::new(args.base_domain.clone(), Arc::new(demo_tenant_directory()))
    } else {
        TenantResolver::new(
            args.base_domain.clone(),
            Arc::new(HttpTenantDirectory::new(http.clone(), args.api_url.clone())),
        )
    };
    let tenant = resolver.resolve(&args.host).await?;

    let attempt_loop = if args.mock {
        AttemptLoopService::new(
            clock,
            Arc::new(MockTestCatalog::new()),
            Arc::new(LocalAttemptApi::new(clock)),
        )
    } else {
        AttemptLoopService::new(
            clock,
            Arc::new(HttpTestCatalog::new(http.clone(), args.api_url.clone())),
            Arc::new(HttpAttemptApi::new(http.clone(), args.api_url.clone())),
        )
    };

    let curriculum = if args.mock {
        CurriculumService::new(Arc::new(InMemoryCurriculumApi::new(clock)))
    } else {
        CurriculumService::new(Arc::new(HttpCurriculumApi::new(
            http.clone(),
            args.api_url.clone(),
        )))
    };

    let test_source = if args.mock {
        TestSource::Mock
    } else {
        TestSource::Live
    };

    let app = DesktopApp {
        role: args.role,
        tenant,
        test_source,
        attempt_loop: Arc::new(attempt_loop),
        curriculum: Arc::new(curriculum),
        media_devices: Arc::new(SimulatedMediaDevices::new(args.deny_media)),
        fullscreen: Arc::new(SimulatedFullscreen),
    };

    let app: Arc<dyn UiApp> = Arc::new(app);
    let context = build_app_context(&app);

    let desktop_cfg = DesktopConfig::new().with_window(
        WindowBuilder::new()
            .with_title("Examhall")
            .with_always_on_top(false),
    );

    LaunchBuilder::desktop()
        .with_cfg(desktop_cfg)
        .with_context(context)
        .launch(App);
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
