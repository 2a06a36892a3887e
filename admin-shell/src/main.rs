use admin_shell::AppShell;
use admin_shell::config::ShellConfig;
use admin_shell::logging::init_logging;
use anyhow::Context;
use route_tree::RouteNode;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ShellConfig::from_env().context("invalid configuration")?;
    let _logging = init_logging(config.log_filter.as_deref(), config.log_json)?;

    let shell = AppShell::builder(config).build()?;
    shell.bootstrap().await.context("failed to restore session")?;

    let username = std::env::var("ADMIN_SHELL_USERNAME").ok();
    let password = std::env::var("ADMIN_SHELL_PASSWORD").ok();
    match (username, password) {
        (Some(username), Some(password)) => {
            shell
                .login(&username, &password)
                .await
                .with_context(|| format!("login as '{username}' failed"))?;
        }
        _ => {
            shell.navigate("/").await?;
        }
    }

    if let Some(location) = shell.current() {
        info!(location = %location, title = %shell.title(), "Navigation settled");
    }

    let menus = shell.menus();
    if menus.is_empty() {
        println!("No menus granted");
    }
    for menu in &menus {
        print_menu(menu, 0);
    }

    Ok(())
}

fn print_menu(route: &RouteNode, depth: usize) {
    let title = if route.meta.title.is_empty() {
        route.name.as_deref().unwrap_or_default()
    } else {
        &route.meta.title
    };
    println!("{:indent$}{title} ({})", "", route.path, indent = depth * 2);

    for child in route.children.iter().filter(|c| c.is_menu_entry()) {
        print_menu(child, depth + 1);
    }
}
