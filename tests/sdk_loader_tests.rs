use nestmap::prelude::*;
use std::thread;

/// SDK script loading shared across callers
#[cfg(test)]
mod sdk_loader_tests {
    use super::*;

    fn loader_on(host: &Arc<InMemoryScriptHost>) -> SdkLoader {
        SdkLoader::new(host.clone(), &SdkConfig::default()).unwrap()
    }

    #[test]
    fn concurrent_callers_share_one_script() {
        let host = Arc::new(InMemoryScriptHost::new());
        let loader = Arc::new(loader_on(&host));

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let loader = loader.clone();
                thread::spawn(move || loader.ensure_loaded())
            })
            .collect();
        let mut subscriptions: Vec<LoadSubscription> =
            workers.into_iter().map(|w| w.join().unwrap()).collect();

        assert_eq!(host.injections(), vec![loader.src().to_string()]);
        assert_eq!(host.listener_count(loader.src()), 4);

        host.fire_load(loader.src());
        for subscription in subscriptions.iter_mut() {
            assert_eq!(
                subscription.wait_timeout(Duration::from_secs(1)),
                LoadState::LOADED
            );
        }
        assert_eq!(loader.state(), LoadState::LOADED);
    }

    #[test]
    fn same_thread_subscribers_both_see_error() {
        let host = Arc::new(InMemoryScriptHost::new());
        let loader = loader_on(&host);

        let mut first = loader.ensure_loaded();
        let mut second = loader.ensure_loaded();
        assert_eq!(host.injections().len(), 1);
        assert_eq!(host.listener_count(loader.src()), 2);
        assert!(!first.is_loaded() && !first.has_error());

        host.fire_error(loader.src());
        assert!(first.has_error());
        assert!(second.has_error());
        assert!(!second.is_loaded());

        drop(first);
        drop(second);
        assert_eq!(host.listener_count(loader.src()), 0);
        assert!(host.has_tag(loader.src()));
    }

    #[test]
    fn present_sdk_resolves_without_injection() {
        let host = Arc::new(InMemoryScriptHost::with_sdk_present());
        let loader = loader_on(&host);

        let mut subscription = loader.ensure_loaded();
        assert!(subscription.is_loaded());
        assert!(!subscription.has_listener());
        assert!(host.injections().is_empty());
    }

    #[test]
    fn pending_tag_is_joined_not_duplicated() {
        let src = SdkConfig::default().script_src().unwrap();
        let host = Arc::new(InMemoryScriptHost::with_pending_tag(&src));
        let loader = loader_on(&host);

        let mut subscription = loader.ensure_loaded();
        assert!(subscription.has_listener());
        assert!(host.injections().is_empty());

        host.fire_load(&src);
        assert!(subscription.is_loaded());
    }

    #[test]
    fn refused_injection_reports_failure() {
        let host = Arc::new(InMemoryScriptHost::new());
        host.refuse_injections();
        let loader = loader_on(&host);

        let mut subscription = loader.ensure_loaded();
        assert_eq!(subscription.state(), LoadState::FAILED);
        assert!(!host.has_tag(loader.src()));
    }

    #[test]
    fn rejected_listener_fails_without_leaving_callbacks() {
        let host = Arc::new(InMemoryScriptHost::new());
        host.refuse_listeners();
        let loader = loader_on(&host);

        let mut subscription = loader.ensure_loaded();
        assert!(subscription.has_error());
        assert!(!subscription.has_listener());
        assert_eq!(host.listener_count(loader.src()), 0);
        assert!(host.has_tag(loader.src()));

        host.fire_load(loader.src());
        assert_eq!(loader.state(), LoadState::FAILED);
    }

    #[test]
    fn failure_is_terminal() {
        let host = Arc::new(InMemoryScriptHost::new());
        let loader = loader_on(&host);
        let _subscription = loader.ensure_loaded();

        host.fire_error(loader.src());
        host.fire_load(loader.src());
        assert_eq!(loader.state(), LoadState::FAILED);

        let mut late = loader.ensure_loaded();
        assert!(late.has_error());
        assert_eq!(host.injections().len(), 1);
    }

    #[test]
    fn settled_loader_answers_without_touching_the_host() {
        let host = Arc::new(InMemoryScriptHost::new());
        let loader = loader_on(&host);
        let _first = loader.ensure_loaded();
        host.fire_load(loader.src());

        let mut late = loader.ensure_loaded();
        assert!(late.is_loaded());
        assert!(!late.has_listener());
        assert_eq!(host.listener_count(loader.src()), 1);
    }

    #[test]
    fn detaching_keeps_the_tag() {
        let host = Arc::new(InMemoryScriptHost::new());
        let loader = loader_on(&host);
        let mut subscription = loader.ensure_loaded();

        subscription.detach();
        assert!(!subscription.has_listener());
        assert_eq!(host.listener_count(loader.src()), 0);
        assert!(host.has_tag(loader.src()));
    }

    #[test]
    fn global_loader_is_installed_once() {
        let host = Arc::new(InMemoryScriptHost::new());
        let first = nestmap::sdk::install(host.clone(), &SdkConfig::default()).unwrap();

        let mut other = SdkConfig::default();
        other.api_key = "another-key".to_string();
        let second = nestmap::sdk::install(Arc::new(InMemoryScriptHost::new()), &other).unwrap();

        assert!(std::ptr::eq(first, second));
        assert!(std::ptr::eq(nestmap::sdk::global().unwrap(), first));
        assert_eq!(second.src(), first.src());
    }
}
