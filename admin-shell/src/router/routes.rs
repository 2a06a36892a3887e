use route_tree::{RouteBuildError, RouteNode, ViewRegistry};

use super::{HOME_PATH, LOGIN_PATH, NOT_FOUND_PATH};

/// Routes present for every visitor, granted or not.
pub fn basic_routes(registry: &ViewRegistry) -> Result<Vec<RouteNode>, RouteBuildError> {
    let workbench = RouteNode::view(
        "Workbench",
        "workbench",
        registry.resolve("Workbench", "/workbench")?,
    )
    .with_title("Workbench")
    .with_icon("icon-park-outline:workbench")
    .affixed();

    let profile = RouteNode::view("Profile", "/profile", registry.resolve("Profile", "/profile")?)
        .with_title("Profile")
        .with_icon("user")
        .affixed();

    Ok(vec![
        RouteNode::layout("Home", HOME_PATH)
            .with_redirect("/workbench")
            .with_order(0)
            .with_children(vec![workbench]),
        RouteNode::layout("Profile", "/profile")
            .with_order(99)
            .with_children(vec![profile])
            .hidden(),
        RouteNode::view("403", "/403", registry.resolve("403", "/error-page/403")?).hidden(),
        RouteNode::view(
            "404",
            NOT_FOUND_PATH,
            registry.resolve("404", "/error-page/404")?,
        )
        .hidden(),
        RouteNode::view("Login", LOGIN_PATH, registry.resolve("Login", "/login")?)
            .with_title("Login")
            .hidden(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::default_registry;
    use route_tree::{flatten, project_menus};

    #[test]
    fn test_basic_routes_resolve() {
        let routes = basic_routes(&default_registry()).unwrap();
        let paths: Vec<_> = flatten(&routes).into_iter().map(|r| r.full_path).collect();
        assert_eq!(
            paths,
            vec!["/", "/workbench", "/profile", "/profile", "/403", "/404", "/login"]
        );

        let menus = project_menus(&routes);
        assert_eq!(menus.len(), 1);
        assert_eq!(menus[0].redirect.as_deref(), Some("/workbench"));
    }

    #[test]
    fn test_missing_view_is_reported() {
        let err = basic_routes(&ViewRegistry::new()).unwrap_err();
        assert!(matches!(err, RouteBuildError::UnresolvedView { .. }));
    }
}
