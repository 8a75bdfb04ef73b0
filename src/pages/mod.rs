use crate::api::ApiErrorKind;
use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Card, CardContent,
    CardDescription, CardHeader, CardTitle, Input, Label, Spinner, Textarea,
};
use crate::models::{Note, NoteFilter};
use crate::state::note_store::{find_note, visible_notes};
use crate::state::note_sync::NoteSyncController;
use crate::state::AppContext;
use crate::util::{excerpt, read_minutes, short_timestamp};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_query_map;
use strum::IntoEnumIterator;

#[component]
pub fn LoginPage() -> impl IntoView {
    let username: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();

    let query = use_query_map();
    let just_registered =
        move || query.with(|q| q.get("registered").as_deref() == Some("true"));

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let username_val = username.get();
        let password_val = password.get();
        let mut api_client = app_state.0.api_client.get_untracked();

        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match api_client.login(&username_val, &password_val).await {
                Ok(tokens) => {
                    api_client.establish_session(tokens.access);
                    app_state.0.api_client.set(api_client);
                    let _ = window().location().set_href("/");
                }
                Err(e) => {
                    let msg = if e.kind == ApiErrorKind::Unauthorized {
                        "Invalid username or password.".to_string()
                    } else {
                        e.to_string()
                    };
                    error.set(Some(msg));
                }
            }
            loading.set(false);
        });
    };

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-sm flex-col justify-center px-4 py-10">
                <div class="mb-6 flex items-center justify-center">
                    <a href="/" class="text-sm font-medium text-foreground">"MindSphere"</a>
                </div>

                <Card>
                    <CardHeader>
                        <CardTitle class="text-lg">"Welcome back"</CardTitle>
                        <CardDescription class="text-xs">"Sign in to your knowledge base."</CardDescription>
                    </CardHeader>

                    <CardContent>
                        <form class="flex flex-col gap-3" on:submit=on_submit>
                            <Show when=just_registered fallback=|| ().into_view()>
                                <Alert>
                                    <AlertDescription>"Account created. You can sign in now."</AlertDescription>
                                </Alert>
                            </Show>

                            <div class="flex flex-col gap-1.5">
                                <Label html_for="username" class="text-xs">"Username"</Label>
                                <Input id="username" r#type="text" bind_value=username required=true />
                            </div>

                            <div class="flex flex-col gap-1.5">
                                <Label html_for="password" class="text-xs">"Password"</Label>
                                <Input id="password" r#type="password" bind_value=password required=true />
                            </div>

                            <Show when=move || error.get().is_some() fallback=|| ().into_view()>
                                {move || {
                                    error.get().map(|e| view! {
                                        <Alert class="border-destructive/30">
                                            <AlertDescription class="text-destructive">{e}</AlertDescription>
                                        </Alert>
                                    })
                                }}
                            </Show>

                            <Button class="w-full" attr:disabled=move || loading.get()>
                                <span class="inline-flex items-center gap-2">
                                    <Show when=move || loading.get() fallback=|| ().into_view()>
                                        <Spinner />
                                    </Show>
                                    {move || if loading.get() { "Signing in..." } else { "Sign in" }}
                                </span>
                            </Button>
                        </form>

                        <div class="mt-4 text-xs text-muted-foreground">
                            "No account? "
                            <a class="text-primary underline underline-offset-4" href="/register">"Register"</a>
                        </div>
                    </CardContent>
                </Card>
            </div>
        </div>
    }
}

#[component]
pub fn RegisterPage() -> impl IntoView {
    let username: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let confirm_password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();

        let username_val = username.get();
        let password_val = password.get();
        let confirm_val = confirm_password.get();
        let api_client = app_state.0.api_client.get_untracked();

        if username_val.trim().is_empty() || password_val.is_empty() {
            error.set(Some("Username and password are required.".to_string()));
            return;
        }
        if password_val != confirm_val {
            error.set(Some("Passwords do not match.".to_string()));
            return;
        }

        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match api_client.register(&username_val, &password_val).await {
                Ok(()) => {
                    let _ = window().location().set_href("/login?registered=true");
                }
                Err(e) => {
                    error.set(Some(e.to_string()));
                }
            }
            loading.set(false);
        });
    };

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-sm flex-col justify-center px-4 py-10">
                <div class="mb-6 flex items-center justify-center">
                    <a href="/" class="text-sm font-medium text-foreground">"MindSphere"</a>
                </div>

                <Card>
                    <CardHeader>
                        <CardTitle class="text-lg">"Create account"</CardTitle>
                        <CardDescription class="text-xs">"A place for everything you know."</CardDescription>
                    </CardHeader>

                    <CardContent>
                        <form class="flex flex-col gap-3" on:submit=on_submit>
                            <div class="flex flex-col gap-1.5">
                                <Label html_for="username" class="text-xs">"Username"</Label>
                                <Input id="username" r#type="text" bind_value=username required=true />
                            </div>

                            <div class="flex flex-col gap-1.5">
                                <Label html_for="password" class="text-xs">"Password"</Label>
                                <Input id="password" r#type="password" bind_value=password required=true />
                            </div>

                            <div class="flex flex-col gap-1.5">
                                <Label html_for="confirm_password" class="text-xs">"Confirm password"</Label>
                                <Input id="confirm_password" r#type="password" bind_value=confirm_password required=true />
                            </div>

                            <Show when=move || error.get().is_some() fallback=|| ().into_view()>
                                {move || {
                                    error.get().map(|e| view! {
                                        <Alert class="border-destructive/30">
                                            <AlertDescription class="text-destructive">{e}</AlertDescription>
                                        </Alert>
                                    })
                                }}
                            </Show>

                            <Button class="w-full" attr:disabled=move || loading.get()>
                                <span class="inline-flex items-center gap-2">
                                    <Show when=move || loading.get() fallback=|| ().into_view()>
                                        <Spinner />
                                    </Show>
                                    {move || if loading.get() { "Creating..." } else { "Create account" }}
                                </span>
                            </Button>
                        </form>

                        <div class="mt-4 text-xs text-muted-foreground">
                            "Already registered? "
                            <a class="text-primary underline underline-offset-4" href="/login">"Sign in"</a>
                        </div>
                    </CardContent>
                </Card>
            </div>
        </div>
    }
}

/// Session gate: the workspace renders only behind a valid session.
#[component]
pub fn RootPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let is_authenticated = move || app_state.0.api_client.get().is_authenticated();

    view! {
        <Show when=is_authenticated fallback=move || view! { <LoginPage /> }>
            <NotesPage />
        </Show>
    }
}

#[component]
pub fn NotesPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let controller = NoteSyncController::new(app_state.clone());

    // Initial load; subsequent fetches go through the search debouncer.
    {
        let controller = controller.clone();
        Effect::new(move |_| {
            controller.load_notes_now();
            controller.load_tags();
        });
    }

    {
        let controller = controller.clone();
        on_cleanup(move || controller.cancel_pending());
    }

    let sidebar_controller = controller.clone();
    let list_controller = controller.clone();
    let editor_controller = controller.clone();
    let editor_state = app_state.clone();

    view! {
        <div class="flex h-screen bg-background text-foreground">
            <WorkspaceSidebar controller=sidebar_controller />
            <NoteListPane controller=list_controller />

            {move || {
                let active = editor_state.0.active_note_id.get();
                let note = active
                    .and_then(|id| find_note(&editor_state.0.notes.get_untracked(), id));
                match note {
                    Some(note) => view! {
                        <NoteEditorPane note=note controller=editor_controller.clone() />
                    }
                    .into_any(),
                    None => view! {
                        <div class="flex flex-1 items-center justify-center text-sm text-muted-foreground">
                            "Select a note on the left, or create a new one."
                        </div>
                    }
                    .into_any(),
                }
            }}
        </div>
    }
}

#[component]
fn WorkspaceSidebar(controller: NoteSyncController) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let filter = app_state.0.filter;

    let new_note_controller = controller.clone();

    let on_logout = move |_| {
        let mut api_client = app_state.0.api_client.get_untracked();
        api_client.clear_session();
        app_state.0.api_client.set(api_client);
        let _ = window().location().set_href("/login");
    };

    view! {
        <aside class="flex w-56 flex-col border-r px-3 py-4">
            <div class="mb-4 px-1 text-sm font-semibold">"MindSphere"</div>

            <Button class="w-full" on:click=move |_| new_note_controller.create_note()>
                "+ New note"
            </Button>

            <nav class="mt-4 flex flex-col gap-1">
                {move || {
                    let current = filter.get();
                    NoteFilter::iter()
                        .map(|f| {
                            let variant = if f == current {
                                ButtonVariant::Outline
                            } else {
                                ButtonVariant::Ghost
                            };
                            view! {
                                <Button
                                    variant=variant
                                    size=ButtonSize::Sm
                                    class="w-full justify-start"
                                    on:click=move |_| filter.set(f)
                                >
                                    {f.to_string()}
                                </Button>
                            }
                        })
                        .collect_view()
                }}
            </nav>

            <div class="mt-auto">
                <Button
                    variant=ButtonVariant::Ghost
                    size=ButtonSize::Sm
                    class="w-full justify-start text-muted-foreground"
                    on:click=on_logout
                >
                    "Sign out"
                </Button>
            </div>
        </aside>
    }
}

#[component]
fn NoteListPane(controller: NoteSyncController) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let notes = app_state.0.notes;
    let filter = app_state.0.filter;
    let loading = app_state.0.notes_loading;
    let notes_error = app_state.0.notes_error;
    let active_id = app_state.0.active_note_id;

    let search_controller = controller.clone();

    view! {
        <section class="flex w-80 flex-col border-r">
            <div class="border-b p-3">
                <input
                    type="text"
                    class="h-9 w-full rounded-md border border-input bg-transparent px-3 text-sm outline-none placeholder:text-muted-foreground focus-visible:ring-2 focus-visible:ring-ring/50"
                    placeholder="Search notes..."
                    prop:value=move || app_state.0.search_query.get()
                    on:input=move |ev| {
                        search_controller.on_search_changed(event_target_value(&ev));
                    }
                />
            </div>

            <Show when=move || notes_error.get().is_some() fallback=|| ().into_view()>
                {move || {
                    notes_error.get().map(|e| view! {
                        <Alert class="m-3 w-auto border-destructive/30">
                            <AlertDescription class="text-destructive">{e}</AlertDescription>
                        </Alert>
                    })
                }}
            </Show>

            <div class="flex-1 overflow-y-auto p-3">
                {move || {
                    if loading.get() && notes.get().is_empty() {
                        return view! {
                            <div class="flex items-center gap-2 px-1 text-xs text-muted-foreground">
                                <Spinner />
                                "Loading notes..."
                            </div>
                        }
                        .into_any();
                    }

                    let visible = visible_notes(&notes.get(), filter.get());
                    if visible.is_empty() {
                        return view! {
                            <div class="px-1 text-xs text-muted-foreground">"No notes found."</div>
                        }
                        .into_any();
                    }

                    visible
                        .into_iter()
                        .map(|note| {
                            view! {
                                <NoteCard
                                    note=note
                                    active_id=active_id
                                    controller=controller.clone()
                                />
                            }
                        })
                        .collect_view()
                        .into_any()
                }}
            </div>
        </section>
    }
}

#[component]
fn NoteCard(
    note: Note,
    active_id: RwSignal<Option<i64>>,
    controller: NoteSyncController,
) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let note_id = note.id;
    let is_favorite = note.is_favorite;
    let is_trashed = note.is_trashed;

    let select_controller = controller.clone();
    let favorite_controller = controller.clone();
    let trash_controller = controller.clone();
    let restore_controller = controller.clone();
    let delete_controller = controller.clone();
    let drop_controller = controller.clone();

    let visible_tags: Vec<_> = note.tags.iter().take(2).cloned().collect();
    let extra_tags = note.tags.len().saturating_sub(2);

    view! {
        <div
            class=move || {
                if active_id.get() == Some(note_id) {
                    "mb-2 cursor-pointer rounded-lg border border-primary/50 bg-accent/40 p-3"
                } else {
                    "mb-2 cursor-pointer rounded-lg border p-3 hover:bg-accent/20"
                }
            }
            draggable="true"
            on:dragstart=move |ev: web_sys::DragEvent| {
                if let Some(dt) = ev.data_transfer() {
                    let _ = dt.set_data("text/plain", &note_id.to_string());
                    dt.set_drop_effect("move");
                }
            }
            on:dragover=move |ev: web_sys::DragEvent| {
                ev.prevent_default();
                if let Some(dt) = ev.data_transfer() {
                    dt.set_drop_effect("move");
                }
            }
            on:drop=move |ev: web_sys::DragEvent| {
                ev.prevent_default();

                let Some(dragged_id) = ev
                    .data_transfer()
                    .and_then(|dt| dt.get_data("text/plain").ok())
                    .and_then(|s| s.parse::<i64>().ok())
                else {
                    return;
                };
                if dragged_id == note_id {
                    return;
                }

                // Drag indices are collection indices, not view indices, so a
                // move lands in the same spot whatever the current filter is.
                let all = app_state.0.notes.get_untracked();
                let from = all.iter().position(|n| n.id == dragged_id);
                let to = all.iter().position(|n| n.id == note_id);
                if let (Some(from), Some(to)) = (from, to) {
                    drop_controller.reorder(from, to);
                }
            }
            on:click=move |_| select_controller.set_active_note(Some(note_id))
        >
            <div class="flex items-baseline justify-between gap-2">
                <h3 class="truncate text-sm font-medium">
                    {if note.title.trim().is_empty() {
                        "Untitled note".to_string()
                    } else {
                        note.title.clone()
                    }}
                </h3>
                <span class="shrink-0 text-[10px] text-muted-foreground">
                    {short_timestamp(&note.updated_at)}
                </span>
            </div>

            <p class="mt-1 text-xs text-muted-foreground">{excerpt(&note.content, 60)}</p>

            <div class="mt-2 flex items-center gap-1">
                {visible_tags
                    .into_iter()
                    .map(|tag| {
                        view! {
                            <span class="rounded-full border border-primary/40 px-2 py-0.5 text-[10px] text-primary">
                                {tag.name}
                            </span>
                        }
                    })
                    .collect_view()}
                <Show when=move || { extra_tags > 0 } fallback=|| ().into_view()>
                    <span class="rounded-full border px-2 py-0.5 text-[10px] text-muted-foreground">
                        {format!("+{extra_tags}")}
                    </span>
                </Show>

                <div class="ml-auto flex items-center gap-1">
                    <Show
                        when=move || !is_trashed
                        fallback=move || {
                            let restore = restore_controller.clone();
                            let delete = delete_controller.clone();
                            view! {
                                <Button
                                    variant=ButtonVariant::Ghost
                                    size=ButtonSize::Sm
                                    class="text-xs text-muted-foreground"
                                    on:click=move |ev: web_sys::MouseEvent| {
                                        ev.stop_propagation();
                                        restore.toggle_trashed(note_id);
                                    }
                                >
                                    "Restore"
                                </Button>
                                <Button
                                    variant=ButtonVariant::Ghost
                                    size=ButtonSize::Sm
                                    class="text-xs text-destructive"
                                    on:click=move |ev: web_sys::MouseEvent| {
                                        ev.stop_propagation();
                                        delete.delete_note_forever(note_id);
                                    }
                                >
                                    "Delete"
                                </Button>
                            }
                        }
                    >
                        {
                            let favorite = favorite_controller.clone();
                            let trash = trash_controller.clone();
                            view! {
                                <Button
                                    variant=ButtonVariant::Ghost
                                    size=ButtonSize::Sm
                                    class=if is_favorite {
                                        "text-xs text-primary"
                                    } else {
                                        "text-xs text-muted-foreground"
                                    }
                                    on:click=move |ev: web_sys::MouseEvent| {
                                        ev.stop_propagation();
                                        favorite.toggle_favorite(note_id);
                                    }
                                >
                                    {if is_favorite { "Unfavorite" } else { "Favorite" }}
                                </Button>
                                <Button
                                    variant=ButtonVariant::Ghost
                                    size=ButtonSize::Sm
                                    class="text-xs text-muted-foreground"
                                    on:click=move |ev: web_sys::MouseEvent| {
                                        ev.stop_propagation();
                                        trash.toggle_trashed(note_id);
                                    }
                                >
                                    "Trash"
                                </Button>
                            }
                        }
                    </Show>
                </div>
            </div>
        </div>
    }
}

#[component]
fn NoteEditorPane(note: Note, controller: NoteSyncController) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let note_id = note.id;

    let title: RwSignal<String> = RwSignal::new(note.title.clone());
    let content: RwSignal<String> = RwSignal::new(note.content.clone());
    let selected_tag_ids: RwSignal<Vec<i64>> =
        RwSignal::new(note.tags.iter().map(|t| t.id).collect());

    // Keystroke -> controller -> debounced autosave. The first run only seeds
    // the tracking; it must not schedule a save for untouched content.
    {
        let controller = controller.clone();
        Effect::new(move |prev: Option<()>| {
            let t = title.get();
            let c = content.get();
            if prev.is_some() {
                controller.on_editor_input(note_id, t, c);
            }
        });
    }

    let tags_controller = controller.clone();
    let updated_at = note.updated_at.clone();

    view! {
        <section class="flex flex-1 flex-col">
            <div class="flex flex-1 flex-col gap-3 overflow-y-auto px-6 py-5">
                <Input
                    class="border-none px-0 text-lg font-semibold shadow-none focus-visible:ring-0"
                    placeholder="Note title..."
                    bind_value=title
                />

                <div class="flex flex-wrap items-center gap-1.5">
                    {move || {
                        app_state
                            .0
                            .tags
                            .get()
                            .into_iter()
                            .map(|tag| {
                                let tag_id = tag.id;
                                let tags_controller = tags_controller.clone();
                                let is_selected =
                                    move || selected_tag_ids.get().contains(&tag_id);
                                view! {
                                    <button
                                        class=move || {
                                            if is_selected() {
                                                "rounded-full border border-primary bg-primary/10 px-2.5 py-0.5 text-xs text-primary"
                                            } else {
                                                "rounded-full border px-2.5 py-0.5 text-xs text-muted-foreground hover:border-primary/50"
                                            }
                                        }
                                        on:click=move |_| {
                                            let mut ids = selected_tag_ids.get_untracked();
                                            if let Some(pos) = ids.iter().position(|id| *id == tag_id) {
                                                ids.remove(pos);
                                            } else {
                                                ids.push(tag_id);
                                            }
                                            selected_tag_ids.set(ids.clone());
                                            tags_controller.set_note_tags(note_id, ids);
                                        }
                                    >
                                        {tag.name}
                                    </button>
                                }
                            })
                            .collect_view()
                    }}
                </div>

                <Textarea
                    class="flex-1 border-none px-0 font-mono text-sm leading-6 shadow-none focus-visible:ring-0"
                    placeholder="Start writing..."
                    bind_value=content
                />
            </div>

            <footer class="flex items-center gap-4 border-t px-6 py-2 text-[11px] text-muted-foreground">
                <span>{format!("Last saved {}", short_timestamp(&updated_at))}</span>
                <span>{move || format!("{} chars", content.get().chars().count())}</span>
                <span>{move || format!("{} min read", read_minutes(&content.get()))}</span>
            </footer>
        </section>
    }
}
